#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate projection between the geographic frame (WGS84, degrees) and
//! the metric projected frame (Greek Grid / GGRS87, EPSG:2100, meters).
//!
//! Geometry values are frame-tagged: [`GeographicPoint`] and
//! [`ProjectedPoint`] (and their polygon counterparts) are distinct types,
//! so mixing frames without an explicit conversion is a compile error
//! rather than a runtime condition. Longitude/easting is always the first
//! ordinate, latitude/northing the second.
//!
//! The transform chain is fixed: WGS84 geodetic -> geocentric -> 3-parameter
//! Helmert shift -> GRS80 geodetic -> transverse Mercator, and the exact
//! inverse. Both directions are pure functions; constructors reject
//! non-finite ordinates so the transforms never see NaN.

mod geometry;
mod greek_grid;

pub use geometry::{
    GeographicMultiPolygon, GeographicPoint, GeographicPolygon, GeometryError, ProjectedPoint,
    ProjectedPolygon,
};
pub use greek_grid::GreekGridProjector;
