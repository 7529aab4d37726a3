//! Artifact storage
//!
//! Local persistence of downloaded judgments and their metadata records,
//! plus the seam to an optional remote object store. Paths are derived
//! deterministically from the document fragment identifier so that a
//! re-crawl of the same window finds existing artifacts and skips them.

mod object_store;
mod paths;

pub use object_store::ObjectStore;
pub use paths::{remote_keys, ArtifactPaths};

use thiserror::Error;

/// Errors that can occur during artifact storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Fragment yields no file name: {0}")]
    BadFragment(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Checks that a payload starts with the PDF file signature
///
/// The portal occasionally serves an HTML error page from the output-file
/// URL; leading whitespace is tolerated, anything else is not a judgment.
pub fn is_pdf(bytes: &[u8]) -> bool {
    let trimmed = match bytes.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(start) => &bytes[start..],
        None => return false,
    };
    trimmed.starts_with(b"%PDF")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_signature() {
        assert!(is_pdf(b"%PDF-1.7 rest"));
        assert!(is_pdf(b"\n  %PDF-1.4"));
    }

    #[test]
    fn test_is_pdf_rejects_html() {
        assert!(!is_pdf(b"<html><body>Session expired</body></html>"));
        assert!(!is_pdf(b""));
        assert!(!is_pdf(b"   \n\t  "));
        assert!(!is_pdf(b"PDF-1.4 missing percent"));
    }
}
