// src/models/analytics.rs
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyActiveUsers {
    pub date: chrono::NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserStats {
    pub total_users: i64,
    pub active_today: i64,
    pub new_users_today: i64,
    pub active_this_week: i64,
    pub active_this_month: i64,
    pub returning_users: i64,
    /// Percentage of users seen more than once, rounded; 0 when there are no users.
    pub return_rate: i64,
    pub daily_active_users: Vec<DailyActiveUsers>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryCount {
    pub course: String,
    pub count: i64,
}

/// Pie-chart friendly distribution of detected course inquiries.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseInquiryStats {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
    pub total_inquiries: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMetrics {
    /// Distinct local calendar days with at least one message.
    pub total_sessions: i64,
    pub total_messages: i64,
    pub unique_chatters: i64,
}
