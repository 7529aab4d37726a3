use crate::storage::StorageResult;
use async_trait::async_trait;
use std::path::Path;

/// Remote object storage capability
///
/// The harvester persists everything locally first; pushing artifacts to a
/// bucket is a best-effort follow-up. Failures are the caller's to log, and
/// never invalidate the local file.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file under the given key, returning a retrievable URL
    async fn upload(&self, local: &Path, key: &str) -> StorageResult<String>;
}
