pub mod admin;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod session;
