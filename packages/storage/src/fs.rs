//! Local filesystem store for offline runs and operator tooling.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{ObjectKeys, StorageError, ZoneStore};

/// Store rooted at a local data directory. Object keys become relative
/// paths under the root; writes replace atomically via a temp file and
/// rename.
pub struct FsStore {
    root: PathBuf,
    keys: ObjectKeys,
}

impl FsStore {
    /// Creates a store rooted at `root` with the default object keys.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keys: ObjectKeys::default(),
        }
    }

    /// Overrides the default object keys.
    #[must_use]
    pub fn with_keys(mut self, keys: ObjectKeys) -> Self {
        self.keys = keys;
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn read_optional(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Atomic replace: write to a sibling temp file, then rename over the
    /// destination.
    async fn write_atomic(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = temp_sibling(&path);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| "object".into(), std::ffi::OsStr::to_os_string);
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl ZoneStore for FsStore {
    async fn load_reference(&self) -> Result<String, StorageError> {
        let path = self.path_for(&self.keys.reference);
        log::info!("Loading reference boundary from {}", path.display());
        let bytes = self
            .read_optional(&self.keys.reference)
            .await?
            .ok_or_else(|| StorageError::Missing {
                key: self.keys.reference.clone(),
            })?;
        String::from_utf8(bytes).map_err(|e| StorageError::Read {
            key: self.keys.reference.clone(),
            source: Box::new(e),
        })
    }

    async fn read_fingerprint(&self) -> Result<Option<String>, StorageError> {
        let Some(bytes) = self.read_optional(&self.keys.fingerprint).await? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Read {
                key: self.keys.fingerprint.clone(),
                source: Box::new(e),
            })
    }

    async fn write_fingerprint(&self, digest: &str) -> Result<(), StorageError> {
        self.write_atomic(&self.keys.fingerprint, digest.as_bytes())
            .await
    }

    async fn write_artifact(&self, bytes: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.keys.artifact, bytes).await
    }

    async fn read_artifact(&self) -> Result<Option<Vec<u8>>, StorageError> {
        self.read_optional(&self.keys.artifact).await
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    #[tokio::test]
    async fn missing_fingerprint_reads_as_none() {
        let dir = TempDir::new("coastwatch-fs-store").unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.read_fingerprint().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fingerprint_round_trips() {
        let dir = TempDir::new("coastwatch-fs-store").unwrap();
        let store = FsStore::new(dir.path());
        store.write_fingerprint("abc123").await.unwrap();
        assert_eq!(
            store.read_fingerprint().await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn artifact_write_creates_parent_directories_and_replaces() {
        let dir = TempDir::new("coastwatch-fs-store").unwrap();
        let store = FsStore::new(dir.path());

        store.write_artifact(b"first").await.unwrap();
        store.write_artifact(b"second").await.unwrap();
        assert_eq!(store.read_artifact().await.unwrap().unwrap(), b"second");

        // No temp file left behind
        let artifact_path = dir
            .path()
            .join("no_swim_zones/wastewater_no_swim_zones.geojson");
        assert!(artifact_path.exists());
        assert!(!artifact_path.with_file_name("wastewater_no_swim_zones.geojson.tmp").exists());
    }

    #[tokio::test]
    async fn missing_reference_is_a_missing_error() {
        let dir = TempDir::new("coastwatch-fs-store").unwrap();
        let store = FsStore::new(dir.path());
        assert!(matches!(
            store.load_reference().await,
            Err(StorageError::Missing { .. })
        ));
    }
}
