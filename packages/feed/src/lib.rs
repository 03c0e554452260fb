#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The upstream plant dataset collaborator.
//!
//! The pipeline needs exactly one synchronous "fetch current dataset" call;
//! [`DatasetFeed`] is that interface. [`HttpFeed`] is the production
//! implementation against the national wastewater registry API;
//! [`FileFeed`] reads the same payload from a local file for offline runs
//! and tests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use coastwatch_models::PlantRecord;
use serde_json::Value;

/// Default plant registry endpoint.
pub const DEFAULT_FEED_URL: &str =
    "https://astikalimata.ypeka.gr/api/query/wastewatertreatmentplants";

/// Request timeout for the feed endpoint.
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching the dataset.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading a local dataset file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The raw upstream dataset: the payload exactly as received (for
/// fingerprinting) plus the parsed plant records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    /// The payload as received, used for the canonical fingerprint.
    pub value: Value,
    /// Parsed plant records, in feed order.
    pub records: Vec<PlantRecord>,
}

impl RawDataset {
    /// Parses a feed payload into records.
    ///
    /// The registry has published both a bare array of records and an
    /// object with a `features` array whose items nest the record under
    /// `properties`; both shapes are tolerated. A record that fails to
    /// parse degrades to an empty record (it will be counted as skipped
    /// downstream) rather than aborting the batch.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let records = parse_records(&value);
        Self { value, records }
    }
}

/// The single "fetch current dataset" capability the pipeline consumes.
#[async_trait]
pub trait DatasetFeed: Send + Sync {
    /// Fetches the current upstream dataset.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the dataset cannot be retrieved or parsed.
    async fn fetch(&self) -> Result<RawDataset, FeedError>;
}

/// Production feed implementation over HTTP.
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    /// Creates a feed client for the given endpoint with the standard
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(FEED_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DatasetFeed for HttpFeed {
    async fn fetch(&self) -> Result<RawDataset, FeedError> {
        log::info!("Fetching plant dataset from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let value: Value = response.json().await?;
        let dataset = RawDataset::from_value(value);
        log::info!("Fetched {} plant records", dataset.records.len());
        Ok(dataset)
    }
}

/// Feed implementation reading a dataset from a local JSON file.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    /// Creates a feed over a local JSON file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetFeed for FileFeed {
    async fn fetch(&self) -> Result<RawDataset, FeedError> {
        log::info!("Reading plant dataset from {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&text)?;
        let dataset = RawDataset::from_value(value);
        log::info!("Read {} plant records", dataset.records.len());
        Ok(dataset)
    }
}

/// Extracts plant records from either feed payload shape.
fn parse_records(value: &Value) -> Vec<PlantRecord> {
    let items = if let Some(array) = value.as_array() {
        array
    } else if let Some(array) = value.get("features").and_then(Value::as_array) {
        array
    } else {
        log::warn!("Unrecognized feed payload shape, treating as empty dataset");
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let body = match item.get("properties") {
                Some(properties) if properties.is_object() => properties,
                _ => item,
            };
            serde_json::from_value(body.clone()).unwrap_or_else(|e| {
                log::warn!("Unparseable plant record ({e}), treating as empty record");
                PlantRecord::default()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_bare_array_payload() {
        let value = json!([
            {"code": "EL1", "name": "one", "latitude": 37.9, "longitude": 23.7},
            {"code": "EL2", "name": "two"}
        ]);
        let dataset = RawDataset::from_value(value);
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0].code.as_deref(), Some("EL1"));
        assert!(dataset.records[1].latitude.is_none());
    }

    #[test]
    fn parses_feature_wrapped_payload() {
        let value = json!({
            "features": [
                {"properties": {"code": "EL1", "name": "one"}},
                {"code": "EL2", "name": "flat record"}
            ]
        });
        let dataset = RawDataset::from_value(value);
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0].code.as_deref(), Some("EL1"));
        assert_eq!(dataset.records[1].code.as_deref(), Some("EL2"));
    }

    #[test]
    fn unrecognized_payload_is_an_empty_dataset() {
        let dataset = RawDataset::from_value(json!({"rows": 3}));
        assert!(dataset.records.is_empty());
    }

    #[test]
    fn malformed_record_degrades_to_empty_record() {
        let value = json!([{"code": ["not", "a", "string"]}]);
        let dataset = RawDataset::from_value(value);
        assert_eq!(dataset.records.len(), 1);
        assert!(dataset.records[0].code.is_none());
    }
}
