#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Content fingerprinting for the upstream dataset.
//!
//! The digest is SHA-256 over a canonical serialization: `serde_json`
//! object maps are ordered (`BTreeMap` keys), so two payloads with the same
//! content but different field order hash identically and the change gate
//! never triggers on serialization noise. Do not enable `serde_json`'s
//! `preserve_order` feature anywhere in the workspace; it would break this
//! canonical ordering.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// A fixed-length digest over the canonical serialization of the raw
/// upstream dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint(String);

impl DatasetFingerprint {
    /// Computes the fingerprint of a raw dataset.
    #[must_use]
    pub fn of(dataset: &Value) -> Self {
        // Value::to_string is compact and key-ordered, which makes it the
        // canonical form.
        let canonical = dataset.to_string();
        Self(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the dataset changed relative to the previously persisted
    /// digest. An absent previous digest (first run) counts as changed.
    #[must_use]
    pub fn has_changed(&self, previous: Option<&str>) -> bool {
        previous.is_none_or(|p| p.trim() != self.0)
    }
}

impl std::fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identical_content_with_reordered_keys_hashes_identically() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": [{"y": 2, "x": 3}]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": [{"x": 3, "y": 2}], "b": 1}"#).unwrap();
        assert_eq!(DatasetFingerprint::of(&a), DatasetFingerprint::of(&b));
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = json!({"plants": [1, 2, 3]});
        let b = json!({"plants": [1, 2, 4]});
        assert_ne!(DatasetFingerprint::of(&a), DatasetFingerprint::of(&b));
    }

    #[test]
    fn digest_is_64_hex_chars() {
        let digest = DatasetFingerprint::of(&json!([]));
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn first_run_counts_as_changed() {
        let digest = DatasetFingerprint::of(&json!([]));
        assert!(digest.has_changed(None));
    }

    #[test]
    fn matching_previous_digest_is_unchanged() {
        let digest = DatasetFingerprint::of(&json!({"a": 1}));
        let persisted = digest.as_str().to_string();
        assert!(!digest.has_changed(Some(&persisted)));
        // Persisted digests may carry a trailing newline
        assert!(!digest.has_changed(Some(&format!("{persisted}\n"))));
        assert!(digest.has_changed(Some("deadbeef")));
    }
}
