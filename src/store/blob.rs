//! Blob store for result payloads too large to keep inline on a task record.

use std::path::PathBuf;

use async_trait::async_trait;

/// Opaque blob storage: put bytes under a key, get them back via the
/// returned locator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return a locator for later retrieval.
    async fn put(&self, key: &str, data: &[u8]) -> Result<String, String>;

    /// Fetch bytes by locator.
    async fn get(&self, locator: &str) -> Result<Vec<u8>, String>;
}

/// Filesystem-backed blob store.
///
/// Locators are paths relative to the store root, so a relocated data
/// directory keeps old locators valid.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub async fn new(root: PathBuf) -> Result<Self, String> {
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| format!("Failed to create blob dir: {}", e))?;
        Ok(Self { root })
    }

    /// Keep locators path-safe: keys become flat file names.
    fn sanitize(key: &str) -> String {
        let mut out = String::with_capacity(key.len());
        for ch in key.chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                out.push(ch);
            } else {
                out.push('_');
            }
        }
        if out.is_empty() {
            "blob".to_string()
        } else {
            out
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<String, String> {
        let locator = Self::sanitize(key);
        let path = self.root.join(&locator);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| format!("Failed to write blob {}: {}", locator, e))?;
        tracing::debug!(locator = %locator, size = data.len(), "Stored blob");
        Ok(locator)
    }

    async fn get(&self, locator: &str) -> Result<Vec<u8>, String> {
        // Locators are flat names; re-sanitizing blocks path traversal.
        let path = self.root.join(Self::sanitize(locator));
        tokio::fs::read(&path)
            .await
            .map_err(|e| format!("Failed to read blob {}: {}", locator, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf()).await.unwrap();

        let locator = store.put("task-1-result.json", b"payload").await.unwrap();
        let data = store.get(&locator).await.unwrap();
        assert_eq!(data, b"payload");
    }

    #[tokio::test]
    async fn keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf()).await.unwrap();

        let locator = store.put("../../etc/passwd", b"x").await.unwrap();
        assert!(!locator.contains('/'));
        assert_eq!(store.get(&locator).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn missing_blob_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf()).await.unwrap();
        assert!(store.get("nope").await.is_err());
    }
}
