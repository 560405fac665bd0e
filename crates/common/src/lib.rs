//! Research Kernel Common Library
//!
//! Data layer shared by the Research Kernel services:
//! - SeaORM entity models with explicit-session mutation primitives
//! - Polymorphic message loading
//! - Schema bootstrap and read helpers
//! - Error types and handling
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Message, Repository, Session, Visibility};
pub use dto::ListSourceDataDto;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
