pub mod admin;
pub mod logging;
pub mod rate_limit;
