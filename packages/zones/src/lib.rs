#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The geometry core of the pipeline.
//!
//! [`regions`] unifies the static coastline/region polygons into one
//! reference geometry; [`calculator`] derives, for each plant record, the
//! portion of a fixed-radius discharge buffer that lies outside that
//! reference — the no-swim zone.

pub mod calculator;
pub mod regions;

pub use calculator::{BUFFER_RADIUS_METERS, ZoneCalculator, ZoneOutcome};
pub use regions::ReferenceGeometry;

use coastwatch_projection::GeometryError;

/// Errors that can occur while building the reference geometry.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// The boundary source was not valid `GeoJSON`.
    #[error("Invalid boundary GeoJSON: {0}")]
    Geojson(#[from] geojson::Error),

    /// The boundary source was valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Boundary source is not a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    /// A boundary polygon carried non-finite ordinates.
    #[error("Invalid boundary geometry: {0}")]
    Geometry(#[from] GeometryError),
}
