// src/services/export.rs
use crate::models::chat::ChatRecord;
use chrono::FixedOffset;
use thiserror::Error;

pub const EXPORT_FILENAME: &str = "chat_history.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Serialize records in the order given, with local timestamps.
pub fn chat_history_csv(records: &[ChatRecord], tz: &FixedOffset) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["timestamp", "user_message", "bot_response"])?;

    for record in records {
        let timestamp = record
            .timestamp
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        writer.write_record([
            timestamp.as_str(),
            record.user_message.as_str(),
            record.bot_response.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::campus_timezone;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_header_only_when_empty() {
        let csv = chat_history_csv(&[], &campus_timezone()).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "timestamp,user_message,bot_response\n");
    }

    #[test]
    fn test_commas_quotes_and_newlines_are_escaped() {
        let record = ChatRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 4, 30, 0).unwrap(),
            user_id: Uuid::new_v4(),
            user_message: "Fees for B.Tech, BCA?".to_string(),
            bot_response: "Say \"hi\"\nthen ask".to_string(),
            course_inquiry: Some("B.Tech".to_string()),
        };

        let text = String::from_utf8(chat_history_csv(&[record], &campus_timezone()).unwrap()).unwrap();
        assert_eq!(
            text,
            "timestamp,user_message,bot_response\n\
             2024-03-15 10:00:00,\"Fees for B.Tech, BCA?\",\"Say \"\"hi\"\"\nthen ask\"\n"
        );

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "Say \"hi\"\nthen ask");
    }
}
