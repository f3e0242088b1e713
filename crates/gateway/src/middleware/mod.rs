//! Router middleware

pub mod metrics;
pub mod rate_limit;
pub mod request_id;
