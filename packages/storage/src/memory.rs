//! In-memory store used by pipeline and integration tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{StorageError, ZoneStore};

#[derive(Default)]
struct State {
    reference: Option<String>,
    fingerprint: Option<String>,
    artifact: Option<Vec<u8>>,
    reference_loads: usize,
}

/// In-memory [`ZoneStore`] double. Records how often the reference
/// boundary was loaded and can be told to fail specific writes, so tests
/// can assert ordering guarantees (artifact before fingerprint, no
/// reference load on the unchanged path).
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_fingerprint_reads: bool,
    fail_fingerprint_writes: bool,
    fail_artifact_writes: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the reference boundary `GeoJSON`.
    #[must_use]
    pub fn with_reference(self, geojson: impl Into<String>) -> Self {
        self.lock().reference = Some(geojson.into());
        self
    }

    /// Seeds a previously persisted fingerprint.
    #[must_use]
    pub fn with_fingerprint(self, digest: impl Into<String>) -> Self {
        self.lock().fingerprint = Some(digest.into());
        self
    }

    /// Makes every fingerprint read fail.
    #[must_use]
    pub const fn failing_fingerprint_reads(mut self) -> Self {
        self.fail_fingerprint_reads = true;
        self
    }

    /// Makes every fingerprint write fail.
    #[must_use]
    pub const fn failing_fingerprint_writes(mut self) -> Self {
        self.fail_fingerprint_writes = true;
        self
    }

    /// Makes every artifact write fail.
    #[must_use]
    pub const fn failing_artifact_writes(mut self) -> Self {
        self.fail_artifact_writes = true;
        self
    }

    /// Currently persisted fingerprint, if any.
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        self.lock().fingerprint.clone()
    }

    /// Currently persisted artifact bytes, if any.
    #[must_use]
    pub fn artifact(&self) -> Option<Vec<u8>> {
        self.lock().artifact.clone()
    }

    /// How many times [`ZoneStore::load_reference`] has been called.
    #[must_use]
    pub fn reference_loads(&self) -> usize {
        self.lock().reference_loads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ZoneStore for MemoryStore {
    async fn load_reference(&self) -> Result<String, StorageError> {
        let mut state = self.lock();
        state.reference_loads += 1;
        state
            .reference
            .clone()
            .ok_or_else(|| StorageError::Missing {
                key: "reference".to_string(),
            })
    }

    async fn read_fingerprint(&self) -> Result<Option<String>, StorageError> {
        if self.fail_fingerprint_reads {
            return Err(StorageError::Read {
                key: "fingerprint".to_string(),
                source: "injected failure".into(),
            });
        }
        Ok(self.lock().fingerprint.clone())
    }

    async fn write_fingerprint(&self, digest: &str) -> Result<(), StorageError> {
        if self.fail_fingerprint_writes {
            return Err(StorageError::Write {
                key: "fingerprint".to_string(),
                source: "injected failure".into(),
            });
        }
        self.lock().fingerprint = Some(digest.to_string());
        Ok(())
    }

    async fn write_artifact(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_artifact_writes {
            return Err(StorageError::Write {
                key: "artifact".to_string(),
                source: "injected failure".into(),
            });
        }
        self.lock().artifact = Some(bytes.to_vec());
        Ok(())
    }

    async fn read_artifact(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock().artifact.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_reference_loads() {
        let store = MemoryStore::new().with_reference("{}");
        assert_eq!(store.reference_loads(), 0);
        store.load_reference().await.unwrap();
        store.load_reference().await.unwrap();
        assert_eq!(store.reference_loads(), 2);
    }

    #[tokio::test]
    async fn injected_write_failure_leaves_state_untouched() {
        let store = MemoryStore::new().failing_fingerprint_writes();
        assert!(store.write_fingerprint("abc").await.is_err());
        assert!(store.fingerprint().is_none());
    }
}
