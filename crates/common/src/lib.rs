//! IdeaHub Common Library
//!
//! Shared code for the IdeaHub services including:
//! - Database models and repository patterns
//! - Idea admission with near-duplicate detection
//! - Accounts and authentication utilities
//! - Chat-completion client abstraction
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod accounts;
pub mod admission;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod similarity;

// Re-export commonly used types
pub use admission::{AdmissionPipeline, DuplicateGuard, Rejection};
pub use assistant::CompletionClient;
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
