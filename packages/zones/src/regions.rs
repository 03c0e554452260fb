//! The unified land/region reference geometry.
//!
//! Built once per run from a static `GeoJSON` `FeatureCollection` of
//! region boundaries, then treated as immutable and shared by reference
//! with every per-record zone computation.

use coastwatch_projection::GeographicMultiPolygon;
use geo::MultiPolygon;
use geojson::GeoJson;

use crate::ZoneError;

/// The unified boundary all zone differences are computed against.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGeometry {
    boundary: GeographicMultiPolygon,
}

impl ReferenceGeometry {
    /// Wraps an already-unified boundary.
    #[must_use]
    pub const fn new(boundary: GeographicMultiPolygon) -> Self {
        Self { boundary }
    }

    /// Parses a `GeoJSON` `FeatureCollection` of region boundaries and
    /// unifies the areal geometries it contains.
    ///
    /// Features without geometry, or with non-areal geometry, are skipped
    /// with a warning; they never abort the load. Zero usable polygons
    /// yield an explicitly empty reference, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError`] if the text is not valid `GeoJSON`, is not a
    /// `FeatureCollection`, or carries non-finite ordinates.
    pub fn from_geojson(text: &str) -> Result<Self, ZoneError> {
        let geojson = text.parse::<GeoJson>()?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(ZoneError::NotAFeatureCollection);
        };

        let mut parts = Vec::new();
        for (index, feature) in collection.features.into_iter().enumerate() {
            let Some(geometry) = feature.geometry else {
                log::warn!("Boundary feature {index} has no geometry, skipping");
                continue;
            };
            match geo::Geometry::<f64>::try_from(geometry) {
                Ok(geo::Geometry::Polygon(polygon)) => {
                    parts.push(GeographicMultiPolygon::new(MultiPolygon(vec![polygon]))?);
                }
                Ok(geo::Geometry::MultiPolygon(multi_polygon)) => {
                    parts.push(GeographicMultiPolygon::new(multi_polygon)?);
                }
                Ok(_) => {
                    log::warn!("Boundary feature {index} is not areal, skipping");
                }
                Err(e) => {
                    log::warn!("Boundary feature {index} has unusable geometry: {e}, skipping");
                }
            }
        }

        log::info!("Unifying {} boundary geometries", parts.len());
        Ok(Self::new(Self::unify(parts)))
    }

    /// Merges a collection of boundary geometries into one via set-theoretic
    /// union. Commutative: input order does not affect the result beyond
    /// coordinate ordering. Zero inputs yield an explicitly empty geometry.
    #[must_use]
    pub fn unify(parts: Vec<GeographicMultiPolygon>) -> GeographicMultiPolygon {
        let mut iter = parts.into_iter();
        let Some(first) = iter.next() else {
            return GeographicMultiPolygon::empty();
        };
        iter.fold(first, |unified, part| unified.union(&part))
    }

    /// The unified boundary.
    #[must_use]
    pub const fn boundary(&self) -> &GeographicMultiPolygon {
        &self.boundary
    }

    /// Whether the reference contains no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, MultiPolygon, polygon};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> GeographicMultiPolygon {
        let p = polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ];
        GeographicMultiPolygon::new(MultiPolygon(vec![p])).unwrap()
    }

    #[test]
    fn unify_of_nothing_is_empty() {
        assert!(ReferenceGeometry::unify(vec![]).is_empty());
    }

    #[test]
    fn unify_merges_overlapping_squares() {
        // Two 1x1 squares overlapping by 0.5x1: union area is 1.5
        let unified = ReferenceGeometry::unify(vec![square(0.0, 0.0, 1.0), square(0.5, 0.0, 1.0)]);
        let area = unified.as_multi_polygon().unsigned_area();
        assert!((area - 1.5).abs() < 1e-9, "area = {area}");
    }

    #[test]
    fn unify_is_order_independent() {
        let parts = [
            square(0.0, 0.0, 1.0),
            square(0.5, 0.0, 1.0),
            square(3.0, 3.0, 2.0),
        ];
        let forward = ReferenceGeometry::unify(parts.to_vec());
        let reversed = ReferenceGeometry::unify(parts.iter().rev().cloned().collect());
        let a = forward.as_multi_polygon().unsigned_area();
        let b = reversed.as_multi_polygon().unsigned_area();
        assert!((a - b).abs() < 1e-9);
        assert_eq!(forward.polygon_count(), reversed.polygon_count());
    }

    #[test]
    fn parses_feature_collection_and_skips_non_areal_features() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "region"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {"name": "capital"},
                    "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}
                }
            ]
        }"#;
        let reference = ReferenceGeometry::from_geojson(text).unwrap();
        assert!(!reference.is_empty());
        assert_eq!(reference.boundary().polygon_count(), 1);
    }

    #[test]
    fn rejects_bare_geometry_document() {
        let text = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        assert!(matches!(
            ReferenceGeometry::from_geojson(text),
            Err(ZoneError::NotAFeatureCollection)
        ));
    }

    #[test]
    fn empty_feature_collection_yields_empty_reference() {
        let reference =
            ReferenceGeometry::from_geojson(r#"{"type": "FeatureCollection", "features": []}"#)
                .unwrap();
        assert!(reference.is_empty());
    }
}
