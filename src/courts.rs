//! Court jurisdiction registry
//!
//! Maps opaque jurisdiction codes (e.g. `"9~13"`) to court display names.
//! The mapping is supplied externally as a JSON file and loaded once at
//! startup; codes not present in it are rejected before any crawl starts.

use crate::{ConfigError, HarvestError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Lookup table from jurisdiction code to court display name
#[derive(Debug, Clone, Default)]
pub struct CourtRegistry {
    courts: HashMap<String, String>,
}

impl CourtRegistry {
    /// Loads the registry from a JSON object file (`{"9~13": "Bombay High Court", ...}`)
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let courts: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self { courts })
    }

    /// Builds a registry from an in-memory mapping
    pub fn from_map(courts: HashMap<String, String>) -> Self {
        Self { courts }
    }

    /// Resolves a code to its display name, failing for unknown codes
    pub fn resolve(&self, code: &str) -> Result<&str> {
        self.courts
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| HarvestError::UnknownJurisdiction {
                code: code.to_string(),
            })
    }

    /// Whether the registry knows this code
    pub fn contains(&self, code: &str) -> bool {
        self.courts.contains_key(code)
    }

    /// Number of known jurisdictions
    pub fn len(&self) -> usize {
        self.courts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}

/// Turns a court display name into a filesystem/key-safe slug
///
/// `"High Court of Punjab & Haryana"` becomes `"high_court_of_punjab_and_haryana"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let lowered = name.to_lowercase().replace('&', " and ");

    let mut last_was_sep = true;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }

    slug.trim_matches('_').to_string()
}
