use crate::scheduler::DateWindow;
use crate::storage::{StorageError, StorageResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Derived on-disk locations for one document's artifacts
///
/// Layout: `<data-dir>/<code>/<court-slug>/<year>/<from>_<to>/<file>` with a
/// sibling `.json` metadata record. The metadata file doubles as the
/// downloaded-marker for idempotent skip checks: it is written even when the
/// PDF payload was rejected, so a re-pass does not re-fetch known-bad rows.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub pdf: PathBuf,
    pub metadata: PathBuf,
    /// Publication year the document is filed under
    pub year: String,
}

impl ArtifactPaths {
    /// Derives artifact paths from a document fragment identifier
    pub fn derive(
        data_dir: &Path,
        court_code: &str,
        court_slug: &str,
        fragment: &str,
        window: &DateWindow,
    ) -> StorageResult<Self> {
        let file_name = Path::new(fragment)
            .file_name()
            .ok_or_else(|| StorageError::BadFragment(fragment.to_string()))?;

        // Prefer the year segment embedded in the fragment path; fall back to
        // the window's from-year.
        let year = year_segment(fragment)
            .unwrap_or_else(|| window.from.format("%Y").to_string());

        let dir = data_dir
            .join(court_code)
            .join(court_slug)
            .join(&year)
            .join(format!("{}_{}", window.from, window.to));

        let pdf = dir.join(file_name);
        let metadata = pdf.with_extension("json");

        Ok(Self { pdf, metadata, year })
    }

    /// Whether this document was already handled by a previous pass
    pub fn already_recorded(&self) -> bool {
        self.metadata.exists()
    }

    pub async fn write_pdf(&self, bytes: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.pdf.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.pdf, bytes).await?;
        Ok(())
    }

    pub async fn write_metadata<T: serde::Serialize>(&self, record: &T) -> StorageResult<()> {
        if let Some(parent) = self.metadata.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&self.metadata, json).await?;
        Ok(())
    }
}

/// Remote object keys for one document's artifacts
///
/// Returns `(pdf_key, metadata_key)` under the configured prefix, e.g.
/// `pdf/highcourt/<slug>/<year>/<name>`.
pub fn remote_keys(prefix: &str, court_slug: &str, paths: &ArtifactPaths) -> (String, String) {
    let pdf_name = paths
        .pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let meta_name = paths
        .metadata
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (
        format!("pdf/{}/{}/{}/{}", prefix, court_slug, paths.year, pdf_name),
        format!(
            "metadata/{}/{}/{}/{}",
            prefix, court_slug, paths.year, meta_name
        ),
    )
}

/// Extracts a `/YYYY/` path segment from a fragment identifier
fn year_segment(fragment: &str) -> Option<String> {
    static YEAR_RE: OnceLock<Regex> = OnceLock::new();
    let re = YEAR_RE.get_or_init(|| Regex::new(r"/(\d{4})/").unwrap());
    re.captures(fragment).map(|c| c[1].to_string())
}
