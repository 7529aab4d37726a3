//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and derives the portal endpoint set from the configured base URL.
//!
//! # Example
//!
//! ```no_run
//! use ecourts_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Page size: {}", config.crawl.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, Endpoints, OcrConfig, OutputConfig, PortalConfig, UploadConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
