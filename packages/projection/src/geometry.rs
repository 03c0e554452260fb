//! Frame-tagged geometry newtypes over `geo` primitives.
//!
//! Constructors validate that every ordinate is finite; after construction
//! the values are immutable. The projected frame uses meters, the
//! geographic frame uses degrees.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Point, Polygon};

/// Errors produced when constructing tagged geometry values.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// An ordinate was NaN or infinite.
    #[error("Non-finite {ordinate} ordinate: {value}")]
    NonFinite {
        /// Which ordinate was invalid (e.g. "longitude").
        ordinate: &'static str,
        /// The offending value.
        value: f64,
    },
}

fn check_finite(ordinate: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { ordinate, value })
    }
}

fn check_coords<'a, I>(coords: I) -> Result<(), GeometryError>
where
    I: Iterator<Item = &'a Coord<f64>>,
{
    for coord in coords {
        check_finite("x", coord.x)?;
        check_finite("y", coord.y)?;
    }
    Ok(())
}

/// A point in the geographic frame (WGS84 longitude/latitude, degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicPoint {
    point: Point<f64>,
}

impl GeographicPoint {
    /// Creates a geographic point from longitude and latitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] if either ordinate is NaN or
    /// infinite.
    pub fn new(lon: f64, lat: f64) -> Result<Self, GeometryError> {
        check_finite("longitude", lon)?;
        check_finite("latitude", lat)?;
        Ok(Self {
            point: Point::new(lon, lat),
        })
    }

    pub(crate) fn from_raw(lon: f64, lat: f64) -> Self {
        Self {
            point: Point::new(lon, lat),
        }
    }

    /// Longitude in degrees (first ordinate).
    #[must_use]
    pub fn lon(&self) -> f64 {
        self.point.x()
    }

    /// Latitude in degrees (second ordinate).
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    /// The underlying untagged point.
    #[must_use]
    pub const fn as_point(&self) -> &Point<f64> {
        &self.point
    }
}

/// A point in the projected frame (Greek Grid easting/northing, meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    point: Point<f64>,
}

impl ProjectedPoint {
    /// Creates a projected point from easting and northing in meters.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] if either ordinate is NaN or
    /// infinite.
    pub fn new(easting: f64, northing: f64) -> Result<Self, GeometryError> {
        check_finite("easting", easting)?;
        check_finite("northing", northing)?;
        Ok(Self {
            point: Point::new(easting, northing),
        })
    }

    pub(crate) fn from_raw(easting: f64, northing: f64) -> Self {
        Self {
            point: Point::new(easting, northing),
        }
    }

    /// Easting in meters (first ordinate).
    #[must_use]
    pub fn easting(&self) -> f64 {
        self.point.x()
    }

    /// Northing in meters (second ordinate).
    #[must_use]
    pub fn northing(&self) -> f64 {
        self.point.y()
    }

    /// Disk polygon around this point: a closed ring of `segments` vertices
    /// at `radius` meters. The tessellation is fixed by `segments`, so the
    /// result is reproducible byte for byte.
    ///
    /// `radius` and `segments` are expected to be fixed positive system
    /// constants.
    #[must_use]
    pub fn buffer(&self, radius: f64, segments: usize) -> ProjectedPolygon {
        debug_assert!(segments >= 3, "a disk needs at least 3 segments");
        let mut ring = Vec::with_capacity(segments + 1);
        for i in 0..segments {
            #[allow(clippy::cast_precision_loss)] // segment counts are tiny
            let theta = std::f64::consts::TAU * (i as f64) / (segments as f64);
            ring.push((
                self.easting() + radius * theta.cos(),
                self.northing() + radius * theta.sin(),
            ));
        }
        // cos(0) and sin(0) are exact, so this closes the ring byte for byte
        ring.push((self.easting() + radius, self.northing()));
        ProjectedPolygon::from_raw(Polygon::new(LineString::from(ring), vec![]))
    }
}

/// A polygon in the geographic frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicPolygon {
    polygon: Polygon<f64>,
}

impl GeographicPolygon {
    /// Tags a polygon as geographic, validating every ordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] if any ordinate is NaN or
    /// infinite.
    pub fn new(polygon: Polygon<f64>) -> Result<Self, GeometryError> {
        check_coords(polygon.exterior().coords())?;
        for interior in polygon.interiors() {
            check_coords(interior.coords())?;
        }
        Ok(Self { polygon })
    }

    pub(crate) fn from_raw(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// The underlying untagged polygon.
    #[must_use]
    pub const fn as_polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Consumes the tag, returning the untagged polygon.
    #[must_use]
    pub fn into_polygon(self) -> Polygon<f64> {
        self.polygon
    }

    /// Set difference `self - other`, staying in the geographic frame.
    #[must_use]
    pub fn difference(&self, other: &GeographicMultiPolygon) -> GeographicMultiPolygon {
        GeographicMultiPolygon {
            multi_polygon: self.polygon.difference(&other.multi_polygon),
        }
    }
}

/// A polygon in the projected frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPolygon {
    polygon: Polygon<f64>,
}

impl ProjectedPolygon {
    /// Tags a polygon as projected, validating every ordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] if any ordinate is NaN or
    /// infinite.
    pub fn new(polygon: Polygon<f64>) -> Result<Self, GeometryError> {
        check_coords(polygon.exterior().coords())?;
        for interior in polygon.interiors() {
            check_coords(interior.coords())?;
        }
        Ok(Self { polygon })
    }

    pub(crate) fn from_raw(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// The underlying untagged polygon.
    #[must_use]
    pub const fn as_polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }
}

/// A multipolygon in the geographic frame.
///
/// Used for the unified reference boundary and for computed zones, both of
/// which live in the geographic frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicMultiPolygon {
    multi_polygon: MultiPolygon<f64>,
}

impl GeographicMultiPolygon {
    /// Tags a multipolygon as geographic, validating every ordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] if any ordinate is NaN or
    /// infinite.
    pub fn new(multi_polygon: MultiPolygon<f64>) -> Result<Self, GeometryError> {
        for polygon in &multi_polygon {
            check_coords(polygon.exterior().coords())?;
            for interior in polygon.interiors() {
                check_coords(interior.coords())?;
            }
        }
        Ok(Self { multi_polygon })
    }

    /// An explicitly empty multipolygon.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            multi_polygon: MultiPolygon(Vec::new()),
        }
    }

    /// Whether this geometry contains no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.multi_polygon.0.is_empty()
    }

    /// Number of member polygons.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.multi_polygon.0.len()
    }

    /// The underlying untagged multipolygon.
    #[must_use]
    pub const fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.multi_polygon
    }

    /// Consumes the tag, returning the untagged multipolygon.
    #[must_use]
    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        self.multi_polygon
    }

    /// Set-theoretic union, staying in the geographic frame.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            multi_polygon: self.multi_polygon.union(&other.multi_polygon),
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, polygon};

    use super::*;

    #[test]
    fn accepts_finite_geographic_point() {
        let p = GeographicPoint::new(23.7, 37.9).unwrap();
        assert!((p.lon() - 23.7).abs() < f64::EPSILON);
        assert!((p.lat() - 37.9).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_nan_longitude() {
        assert!(GeographicPoint::new(f64::NAN, 37.9).is_err());
    }

    #[test]
    fn rejects_infinite_northing() {
        assert!(ProjectedPoint::new(500_000.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_polygon_with_nan_vertex() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (f64::NAN, 1.0), (0.0, 0.0)]);
        assert!(GeographicPolygon::new(Polygon::new(ring, vec![])).is_err());
    }

    #[test]
    fn buffer_ring_is_closed_and_has_the_requested_tessellation() {
        let center = ProjectedPoint::new(478_000.0, 4_200_000.0).unwrap();
        let disk = center.buffer(200.0, 64);
        let ring: Vec<_> = disk.as_polygon().exterior().coords().copied().collect();
        assert_eq!(ring.len(), 65);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn empty_multi_polygon_is_empty() {
        let empty = GeographicMultiPolygon::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.polygon_count(), 0);
    }

    #[test]
    fn accepts_valid_multi_polygon() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let mp = GeographicMultiPolygon::new(MultiPolygon(vec![square])).unwrap();
        assert_eq!(mp.polygon_count(), 1);
    }
}
