//! e-Courts judgment harvester
//!
//! This crate crawls a CAPTCHA-gated judgment-publishing portal: it maintains
//! a server-issued session and rotating authorization token, paginates search
//! results per court and date window, downloads the referenced PDF judgments,
//! and tracks forward progress so interrupted runs resume where they left off.

pub mod captcha;
pub mod config;
pub mod courts;
pub mod crawler;
pub mod metadata;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session init failed: server did not issue a session cookie")]
    SessionInit,

    #[error("Session expired and token refresh gave up after {attempts} attempts")]
    SessionExpired { attempts: u32 },

    #[error("Captcha unsolvable after {attempts} attempts")]
    CaptchaUnsolvable { attempts: u32 },

    #[error("Unknown jurisdiction code: {code}")]
    UnknownJurisdiction { code: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Progress file error: {0}")]
    Progress(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse court registry: {0}")]
    Registry(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use courts::CourtRegistry;
pub use progress::ProgressTracker;
pub use scheduler::{CrawlScheduler, CrawlTask, DateWindow};
