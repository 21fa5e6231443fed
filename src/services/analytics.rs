// src/services/analytics.rs
//! Read-side aggregation for the admin dashboard. Everything here is a pure
//! function of the rows handed in and "now"; nothing is cached.

use crate::models::analytics::{ChatMetrics, CourseInquiryStats, DailyActiveUsers, InquiryCount, UserStats};
use crate::models::chat::ChatRecord;
use crate::models::session::UserSession;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};

pub const DAILY_ACTIVE_DAYS: i64 = 7;
pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const RECENT_CONVERSATIONS: usize = 50;

/// Start of the local calendar day containing `now`, as a UTC instant.
pub fn local_midnight(now: DateTime<Utc>, tz: &FixedOffset) -> DateTime<Utc> {
    day_start(now.with_timezone(tz).date_naive(), tz)
}

fn day_start(date: NaiveDate, tz: &FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // A fixed offset never makes local times ambiguous or skipped.
    match tz.from_local_datetime(&midnight).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

pub fn return_rate(returning: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    ((returning as f64 / total as f64) * 100.0).round() as i64
}

fn count_where(sessions: &[UserSession], pred: impl Fn(&UserSession) -> bool) -> i64 {
    sessions.iter().filter(|s| pred(*s)).count() as i64
}

pub fn user_stats(sessions: &[UserSession], now: DateTime<Utc>, tz: &FixedOffset) -> UserStats {
    let today_start = local_midnight(now, tz);
    let week_start = today_start - Duration::days(7);
    let month_start = today_start - Duration::days(30);

    let total_users = sessions.len() as i64;
    let returning_users = count_where(sessions, |s| s.is_returning());

    UserStats {
        total_users,
        active_today: count_where(sessions, |s| s.last_active >= today_start),
        new_users_today: count_where(sessions, |s| s.created_at >= today_start),
        active_this_week: count_where(sessions, |s| s.last_active >= week_start),
        active_this_month: count_where(sessions, |s| s.last_active >= month_start),
        returning_users,
        return_rate: return_rate(returning_users, total_users),
        daily_active_users: daily_active_users(sessions, now, tz),
    }
}

/// Exactly seven entries, today and the six days before it, oldest first.
pub fn daily_active_users(sessions: &[UserSession], now: DateTime<Utc>, tz: &FixedOffset) -> Vec<DailyActiveUsers> {
    let today = now.with_timezone(tz).date_naive();
    let week_start = local_midnight(now, tz) - Duration::days(7);

    let mut buckets: BTreeMap<NaiveDate, i64> = (0..DAILY_ACTIVE_DAYS)
        .rev()
        .map(|offset| (today - Duration::days(offset), 0))
        .collect();

    for session in sessions.iter().filter(|s| s.last_active >= week_start) {
        let day = session.last_active.with_timezone(tz).date_naive();
        if let Some(count) = buckets.get_mut(&day) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, count)| DailyActiveUsers { date, count })
        .collect()
}

/// Counts sorted by volume, ties broken alphabetically.
pub fn course_inquiry_stats(mut counts: Vec<InquiryCount>) -> CourseInquiryStats {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.course.cmp(&b.course)));

    let total_inquiries = counts.iter().map(|c| c.count).sum();
    let (labels, values) = counts.into_iter().map(|c| (c.course, c.count)).unzip();

    CourseInquiryStats {
        labels,
        values,
        total_inquiries,
    }
}

pub fn chat_metrics(records: &[ChatRecord], tz: &FixedOffset) -> ChatMetrics {
    let days: HashSet<NaiveDate> = records
        .iter()
        .map(|r| r.timestamp.with_timezone(tz).date_naive())
        .collect();
    let chatters: HashSet<_> = records.iter().map(|r| r.user_id).collect();

    ChatMetrics {
        total_sessions: days.len() as i64,
        total_messages: records.len() as i64,
        unique_chatters: chatters.len() as i64,
    }
}

/// The newest records first, capped for display.
pub fn recent_conversations(records: &[ChatRecord]) -> Vec<ChatRecord> {
    let mut recent = records.to_vec();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(RECENT_CONVERSATIONS);
    recent
}

/// Inclusive range of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Missing bounds default to the last thirty days through today.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, now: DateTime<Utc>, tz: &FixedOffset) -> Self {
        let today = now.with_timezone(tz).date_naive();
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(today - Duration::days(DEFAULT_RANGE_DAYS));
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Half-open UTC bounds covering both end dates in full.
    pub fn utc_bounds(&self, tz: &FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        (day_start(self.start, tz), day_start(self.end, tz) + Duration::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::campus_timezone;
    use uuid::Uuid;

    fn at(tz: &FixedOffset, y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().with_timezone(&Utc)
    }

    fn session(created: DateTime<Utc>, last: DateTime<Utc>, count: i64) -> UserSession {
        UserSession {
            user_id: Uuid::new_v4(),
            created_at: created,
            last_active: last,
            access_count: count,
        }
    }

    #[test]
    fn test_return_rate_rounds_and_handles_zero() {
        assert_eq!(return_rate(0, 0), 0);
        assert_eq!(return_rate(1, 3), 33);
        assert_eq!(return_rate(2, 3), 67);
        assert_eq!(return_rate(4, 4), 100);
    }

    #[test]
    fn test_empty_registry_stats() {
        let tz = campus_timezone();
        let stats = user_stats(&[], Utc::now(), &tz);
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.return_rate, 0);
        assert_eq!(stats.daily_active_users.len(), 7);
        assert!(stats.daily_active_users.iter().all(|d| d.count == 0));
    }

    #[test]
    fn test_windows_use_local_midnight() {
        let tz = campus_timezone();
        let now = at(&tz, 2024, 3, 15, 10);
        let sessions = vec![
            // 00:30 local today is 19:00 UTC yesterday.
            session(at(&tz, 2024, 3, 15, 0) + Duration::minutes(30), at(&tz, 2024, 3, 15, 0) + Duration::minutes(30), 1),
            session(at(&tz, 2024, 3, 1, 9), at(&tz, 2024, 3, 14, 23), 3),
            session(at(&tz, 2024, 2, 1, 9), at(&tz, 2024, 3, 1, 9), 2),
            session(at(&tz, 2024, 1, 1, 9), at(&tz, 2024, 1, 2, 9), 1),
        ];

        let stats = user_stats(&sessions, now, &tz);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.active_today, 1);
        assert_eq!(stats.new_users_today, 1);
        assert_eq!(stats.active_this_week, 2);
        assert_eq!(stats.active_this_month, 3);
        assert_eq!(stats.returning_users, 2);
        assert_eq!(stats.return_rate, 50);
    }

    #[test]
    fn test_daily_active_series_is_zero_filled_and_ascending() {
        let tz = campus_timezone();
        let now = at(&tz, 2024, 3, 15, 10);
        let sessions = vec![
            session(now, now, 1),
            session(now, at(&tz, 2024, 3, 15, 1), 1),
            session(now, at(&tz, 2024, 3, 12, 20), 1),
            session(now, at(&tz, 2024, 3, 1, 20), 1),
        ];

        let series = daily_active_users(&sessions, now, &tz);
        let dates: Vec<NaiveDate> = series.iter().map(|d| d.date).collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(dates[6], NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(dates.windows(2).all(|w| w[0] < w[1]));

        let counts: Vec<i64> = series.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 1, 0, 0, 2]);
    }

    #[test]
    fn test_inquiry_stats_sorted_with_ties_by_name() {
        let stats = course_inquiry_stats(vec![
            InquiryCount { course: "BCA".to_string(), count: 2 },
            InquiryCount { course: "B.Tech".to_string(), count: 5 },
            InquiryCount { course: "B.Sc".to_string(), count: 2 },
        ]);
        assert_eq!(stats.labels, vec!["B.Tech", "B.Sc", "BCA"]);
        assert_eq!(stats.values, vec![5, 2, 2]);
        assert_eq!(stats.total_inquiries, 9);
    }

    #[test]
    fn test_chat_metrics_count_local_days_and_chatters() {
        let tz = campus_timezone();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let record = |user_id, timestamp| ChatRecord {
            timestamp,
            user_id,
            user_message: "hi".to_string(),
            bot_response: "hello".to_string(),
            course_inquiry: None,
        };
        let records = vec![
            record(alice, at(&tz, 2024, 3, 15, 1)),
            record(alice, at(&tz, 2024, 3, 15, 23)),
            record(bob, at(&tz, 2024, 3, 14, 12)),
        ];

        let metrics = chat_metrics(&records, &tz);
        assert_eq!(metrics.total_sessions, 2);
        assert_eq!(metrics.total_messages, 3);
        assert_eq!(metrics.unique_chatters, 2);

        let recent = recent_conversations(&records);
        assert_eq!(recent[0].timestamp, at(&tz, 2024, 3, 15, 23));
        assert_eq!(recent[2].user_id, bob);
    }

    #[test]
    fn test_date_range_defaults_and_bounds() {
        let tz = campus_timezone();
        let now = at(&tz, 2024, 3, 15, 10);
        let range = DateRange::resolve(None, None, now, &tz);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());

        let (start, end) = range.utc_bounds(&tz);
        assert_eq!(start, at(&tz, 2024, 2, 14, 0));
        assert_eq!(end, at(&tz, 2024, 3, 16, 0));

        let backwards = DateRange::resolve(NaiveDate::from_ymd_opt(2024, 3, 10), NaiveDate::from_ymd_opt(2024, 3, 1), now, &tz);
        assert!(!backwards.is_valid());
    }
}
