#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blob storage collaborator for the pipeline.
//!
//! [`ZoneStore`] is the explicit capability interface the orchestrator
//! depends on: load the reference boundary, read/write the persisted
//! fingerprint, and replace the published artifact. Three implementations:
//! [`S3Store`] (production, S3-compatible object storage), [`FsStore`]
//! (local data directory, atomic replace via temp file + rename), and
//! [`MemoryStore`] (in-memory double for tests — a first-class
//! implementation, not a conditional shim).

mod fs;
mod memory;
mod s3;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use async_trait::async_trait;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required object is missing from the store.
    #[error("Object not found: {key}")]
    Missing {
        /// Key of the missing object.
        key: String,
    },

    /// Reading an object failed.
    #[error("Failed to read {key}: {source}")]
    Read {
        /// Object key.
        key: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing an object failed.
    #[error("Failed to write {key}: {source}")]
    Write {
        /// Object key.
        key: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error on the local filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object keys for the three persisted blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeys {
    /// The static region boundary `GeoJSON`.
    pub reference: String,
    /// The persisted dataset fingerprint.
    pub fingerprint: String,
    /// The published zone artifact.
    pub artifact: String,
}

impl Default for ObjectKeys {
    fn default() -> Self {
        Self {
            reference: "perifereiesWGS84.geojson".to_string(),
            fingerprint: "wastewater_data_hash.txt".to_string(),
            artifact: "no_swim_zones/wastewater_no_swim_zones.geojson".to_string(),
        }
    }
}

/// The storage capabilities the pipeline orchestrator consumes.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Loads the reference boundary `GeoJSON` text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Missing`] when the boundary object does not
    /// exist, [`StorageError::Read`] on transport failures. Both are fatal
    /// to the run.
    async fn load_reference(&self) -> Result<String, StorageError>;

    /// Reads the previously persisted fingerprint. `Ok(None)` on first run.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] on transport failures.
    async fn read_fingerprint(&self) -> Result<Option<String>, StorageError>;

    /// Persists the fingerprint, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] on failure.
    async fn write_fingerprint(&self, digest: &str) -> Result<(), StorageError>;

    /// Replaces the published artifact wholesale (atomic replace, never a
    /// field-by-field merge).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] on failure.
    async fn write_artifact(&self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Reads the currently published artifact, if any. Used by the
    /// downstream sync collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] on transport failures.
    async fn read_artifact(&self) -> Result<Option<Vec<u8>>, StorageError>;
}
