#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for the no-swim zone pipeline.
//!
//! [`PlantRecord`] is the immutable upstream record for one wastewater
//! treatment plant; [`NoSwimZone`] is the derived output feature; a
//! [`ZoneCollection`] is the ordered set of zones for one run, serialized
//! wholesale as a `GeoJSON` `FeatureCollection`.

use coastwatch_projection::GeographicMultiPolygon;
use geojson::{Feature, FeatureCollection, Geometry};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

/// Why a plant record was skipped instead of producing a zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// Neither the well-known-text geometry nor the lat/long pair yielded a
    /// usable discharge point.
    MissingCoordinates,
    /// Coordinates were present but NaN or infinite.
    NonFiniteCoordinates,
}

/// One wastewater treatment plant record as published by the upstream feed.
///
/// Every field is optional: upstream geodata is heterogeneous and a record
/// with missing fields must not abort the batch. A usable discharge point
/// exists only if `receiver_location` parses to a non-empty point or both
/// `latitude` and `longitude` are present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlantRecord {
    /// Plant identifier code.
    pub code: Option<String>,
    /// Plant name.
    pub name: Option<String>,
    /// Name of the receiving body of water.
    pub receiver_name: Option<String>,
    /// English name of the receiving body of water.
    pub receiver_name_en: Option<String>,
    /// Type of the receiving body of water (sea, river, ...).
    pub receiver_water_type: Option<String>,
    /// Fallback latitude, degrees. Accepts numbers or numeric strings.
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    /// Fallback longitude, degrees. Accepts numbers or numeric strings.
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    /// Discharge point as well-known text (e.g. `POINT (23.7 37.9)`).
    pub receiver_location: Option<String>,
    /// Compliance flag. Absent means compliant.
    #[serde(rename = "is_compliant")]
    pub is_compliant: Option<bool>,
}

impl PlantRecord {
    /// The compliance flag with the upstream default applied: a missing
    /// `is_compliant` field means compliant.
    #[must_use]
    pub fn compliance(&self) -> bool {
        self.is_compliant.unwrap_or(true)
    }

    /// A short human-readable label for log lines.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.code.as_deref())
            .unwrap_or("<unnamed plant>")
    }
}

/// Accepts a JSON number, a numeric string, or null/absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A computed no-swim zone for one plant: the portion of the 200 m discharge
/// buffer lying outside the unified land reference, plus the metadata the
/// downstream renderer needs.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct NoSwimZone {
    /// Zone geometry in the geographic frame.
    pub geometry: GeographicMultiPolygon,
    /// Plant identifier code.
    pub code: Option<String>,
    /// Plant name.
    pub name: Option<String>,
    /// Name of the receiving body of water.
    pub receiver_name: Option<String>,
    /// English name of the receiving body of water.
    pub receiver_name_en: Option<String>,
    /// Type of the receiving body of water.
    pub receiver_water_type: Option<String>,
    /// Fallback latitude carried through from the record.
    pub latitude: Option<f64>,
    /// Fallback longitude carried through from the record.
    pub longitude: Option<f64>,
    /// Display label for the zone.
    pub location: String,
    /// Compliance flag (defaulted to `true` when the record omits it).
    pub compliance: bool,
    /// Human-readable details string.
    pub details: String,
}

impl NoSwimZone {
    /// Builds a zone from a plant record and its computed geometry,
    /// synthesizing the `location` and `details` strings.
    #[must_use]
    pub fn from_record(record: &PlantRecord, geometry: GeographicMultiPolygon) -> Self {
        let location = match (&record.name, &record.code) {
            (Some(name), _) => name.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "Unknown location".to_string(),
        };
        let details = format!(
            "Code: {}. Receiver: {}",
            record.code.as_deref().unwrap_or("N/A"),
            record.receiver_name.as_deref().unwrap_or("N/A"),
        );

        Self {
            geometry,
            code: record.code.clone(),
            name: record.name.clone(),
            receiver_name: record.receiver_name.clone(),
            receiver_name_en: record.receiver_name_en.clone(),
            receiver_water_type: record.receiver_water_type.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            location,
            compliance: record.compliance(),
            details,
        }
    }

    /// Converts the zone to a `GeoJSON` feature.
    ///
    /// The property keys — including the legacy `Column1.compliance` key —
    /// are the contract with the downstream KML renderer and must not be
    /// renamed.
    #[must_use]
    pub fn to_feature(&self) -> Feature {
        let mut properties = Map::new();
        properties.insert("code".to_string(), opt_string(self.code.as_deref()));
        properties.insert("name".to_string(), opt_string(self.name.as_deref()));
        properties.insert(
            "receiverName".to_string(),
            opt_string(self.receiver_name.as_deref()),
        );
        properties.insert(
            "receiverNameEn".to_string(),
            opt_string(self.receiver_name_en.as_deref()),
        );
        properties.insert(
            "receiverWaterType".to_string(),
            opt_string(self.receiver_water_type.as_deref()),
        );
        properties.insert("latitude".to_string(), opt_f64(self.latitude));
        properties.insert("longitude".to_string(), opt_f64(self.longitude));
        properties.insert("location".to_string(), Value::from(self.location.clone()));
        properties.insert(
            "Column1.compliance".to_string(),
            Value::from(self.compliance),
        );
        properties.insert("details".to_string(), Value::from(self.details.clone()));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(
                self.geometry.as_multi_polygon(),
            ))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

fn opt_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::from(s.to_string()))
}

fn opt_f64(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// The ordered output set of zones for one run.
///
/// Persisted atomically as a single `GeoJSON` `FeatureCollection` artifact
/// that replaces any previous version wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneCollection {
    zones: Vec<NoSwimZone>,
}

impl ZoneCollection {
    /// Creates a collection preserving the given order.
    #[must_use]
    pub const fn new(zones: Vec<NoSwimZone>) -> Self {
        Self { zones }
    }

    /// Whether the run produced no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// The zones, in output order.
    #[must_use]
    pub fn zones(&self) -> &[NoSwimZone] {
        &self.zones
    }

    /// Converts the collection to a `GeoJSON` `FeatureCollection`.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.zones.iter().map(NoSwimZone::to_feature).collect(),
            foreign_members: None,
        }
    }

    /// Serializes the collection to the artifact byte representation.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if serialization fails.
    pub fn to_artifact_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_feature_collection())
    }
}
