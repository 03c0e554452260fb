//! The fixed WGS84 <-> Greek Grid (EPSG:2100) transform pair.
//!
//! Greek Grid is a transverse Mercator projection on the GRS80 ellipsoid
//! (GGRS87 datum): central meridian 24°E, scale 0.9996, false easting
//! 500 000 m. The datum differs from WGS84 by a three-parameter geocentric
//! shift (EPSG transformation 1272), so the chain is
//!
//! ```text
//! WGS84 lon/lat -> geocentric XYZ -> Helmert -> GRS80 lon/lat -> TM -> E/N
//! ```
//!
//! and the exact reverse for the inverse direction. The series expansions
//! are the standard ones (Snyder, Map Projections: A Working Manual,
//! eqs. 8-9 to 8-25) extended with the usual seventh/eighth-order Redfearn
//! terms, which round-trip well below a millimeter across the longitudes
//! this system is defined over.

use geo::{LineString, Polygon};

use crate::geometry::{
    GeographicPoint, GeographicPolygon, ProjectedPoint, ProjectedPolygon,
};

/// Central meridian of the Greek Grid, degrees east.
const LON_ORIGIN_DEG: f64 = 24.0;

/// Scale factor at the central meridian.
const SCALE: f64 = 0.9996;

/// False easting, meters.
const FALSE_EASTING: f64 = 500_000.0;

/// False northing, meters.
const FALSE_NORTHING: f64 = 0.0;

/// GGRS87 -> WGS84 geocentric translation, meters (EPSG:1272).
const SHIFT_X: f64 = -199.87;
const SHIFT_Y: f64 = 74.79;
const SHIFT_Z: f64 = 246.62;

/// Ellipsoid definition with the derived quantities the transform needs.
#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    /// Semi-major axis, meters.
    a: f64,
    /// First eccentricity squared.
    e2: f64,
    /// Second eccentricity squared.
    ep2: f64,
}

impl Ellipsoid {
    fn new(a: f64, inverse_flattening: f64) -> Self {
        let f = 1.0 / inverse_flattening;
        let e2 = f * (2.0 - f);
        Self {
            a,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    fn wgs84() -> Self {
        Self::new(6_378_137.0, 298.257_223_563)
    }

    fn grs80() -> Self {
        Self::new(6_378_137.0, 298.257_222_101)
    }

    /// Prime vertical radius of curvature at geodetic latitude `lat` (radians).
    fn prime_vertical_radius(&self, lat: f64) -> f64 {
        self.a / (1.0 - self.e2 * lat.sin().powi(2)).sqrt()
    }

    /// Meridian arc length from the equator to latitude `lat` (radians).
    fn meridian_arc(&self, lat: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }
}

/// Stateless projector between WGS84 and the Greek Grid.
///
/// Construction caches the two ellipsoid definitions; the transform methods
/// are pure and have no side effects.
#[derive(Debug, Clone, Copy)]
pub struct GreekGridProjector {
    wgs84: Ellipsoid,
    grs80: Ellipsoid,
}

impl Default for GreekGridProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl GreekGridProjector {
    /// Creates the projector with the fixed WGS84/GRS80 definitions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wgs84: Ellipsoid::wgs84(),
            grs80: Ellipsoid::grs80(),
        }
    }

    /// Projects a geographic point to the metric frame.
    #[must_use]
    pub fn to_metric_point(&self, point: &GeographicPoint) -> ProjectedPoint {
        let lon = point.lon().to_radians();
        let lat = point.lat().to_radians();

        let (x, y, z) = geodetic_to_geocentric(&self.wgs84, lon, lat, 0.0);
        // WGS84 -> GGRS87 is the inverse of the published shift
        let (x, y, z) = (x - SHIFT_X, y - SHIFT_Y, z - SHIFT_Z);
        let (lon_g, lat_g, _h) = geocentric_to_geodetic(&self.grs80, x, y, z);

        let (easting, northing) = tm_forward(&self.grs80, lon_g, lat_g);
        ProjectedPoint::from_raw(easting, northing)
    }

    /// Projects a metric point back to the geographic frame.
    #[must_use]
    pub fn to_geographic_point(&self, point: &ProjectedPoint) -> GeographicPoint {
        let (lon_g, lat_g) = tm_inverse(&self.grs80, point.easting(), point.northing());

        // The forward direction drops the GGRS87 ellipsoidal height of the
        // WGS84 surface point (tens of meters around Greece); assuming zero
        // here would displace the shifted point laterally by about a
        // millimeter. A zero-height first pass recovers that height as the
        // residual WGS84 height, and the second pass reinstates it so the
        // shift inverts to well below the round-trip tolerance.
        let (_, _, residual) = self.shift_to_wgs84(lon_g, lat_g, 0.0);
        let (lon, lat, _h) = self.shift_to_wgs84(lon_g, lat_g, -residual);

        GeographicPoint::from_raw(lon, lat)
    }

    /// Applies the GGRS87 -> WGS84 datum shift to a GRS80 geodetic position
    /// (radians, meters), returning WGS84 longitude/latitude in degrees and
    /// the ellipsoidal height in meters.
    fn shift_to_wgs84(&self, lon: f64, lat: f64, height: f64) -> (f64, f64, f64) {
        let (x, y, z) = geodetic_to_geocentric(&self.grs80, lon, lat, height);
        let (lon_w, lat_w, h_w) =
            geocentric_to_geodetic(&self.wgs84, x + SHIFT_X, y + SHIFT_Y, z + SHIFT_Z);
        (lon_w.to_degrees(), lat_w.to_degrees(), h_w)
    }

    /// Projects a geographic polygon to the metric frame, vertex by vertex.
    #[must_use]
    pub fn to_metric_polygon(&self, polygon: &GeographicPolygon) -> ProjectedPolygon {
        ProjectedPolygon::from_raw(self.map_polygon(polygon.as_polygon(), |p| {
            let projected = self.to_metric_point(&GeographicPoint::from_raw(p.0, p.1));
            (projected.easting(), projected.northing())
        }))
    }

    /// Projects a metric polygon back to the geographic frame, vertex by
    /// vertex.
    #[must_use]
    pub fn to_geographic_polygon(&self, polygon: &ProjectedPolygon) -> GeographicPolygon {
        GeographicPolygon::from_raw(self.map_polygon(polygon.as_polygon(), |p| {
            let geographic = self.to_geographic_point(&ProjectedPoint::from_raw(p.0, p.1));
            (geographic.lon(), geographic.lat())
        }))
    }

    fn map_polygon<F>(&self, polygon: &Polygon<f64>, f: F) -> Polygon<f64>
    where
        F: Fn((f64, f64)) -> (f64, f64),
    {
        let map_ring = |ring: &LineString<f64>| {
            LineString::from(
                ring.coords()
                    .map(|c| f((c.x, c.y)))
                    .collect::<Vec<(f64, f64)>>(),
            )
        };
        Polygon::new(
            map_ring(polygon.exterior()),
            polygon.interiors().iter().map(map_ring).collect(),
        )
    }
}

/// Geodetic (radians, meters) to geocentric Cartesian coordinates.
fn geodetic_to_geocentric(ell: &Ellipsoid, lon: f64, lat: f64, height: f64) -> (f64, f64, f64) {
    let n = ell.prime_vertical_radius(lat);
    let x = (n + height) * lat.cos() * lon.cos();
    let y = (n + height) * lat.cos() * lon.sin();
    let z = (n * (1.0 - ell.e2) + height) * lat.sin();
    (x, y, z)
}

/// Geocentric Cartesian to geodetic coordinates (radians, meters).
///
/// Latitude by fixed-point iteration; converges to machine precision in a
/// handful of steps for surface points.
fn geocentric_to_geodetic(ell: &Ellipsoid, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let lon = y.atan2(x);
    let p = x.hypot(y);

    let mut lat = (z / (p * (1.0 - ell.e2))).atan();
    for _ in 0..10 {
        let n = ell.prime_vertical_radius(lat);
        let next = ((z + ell.e2 * n * lat.sin()) / p).atan();
        if (next - lat).abs() < 1e-15 {
            lat = next;
            break;
        }
        lat = next;
    }

    let n = ell.prime_vertical_radius(lat);
    let height = p / lat.cos() - n;
    (lon, lat, height)
}

/// Transverse Mercator forward: geodetic (radians) to easting/northing.
fn tm_forward(ell: &Ellipsoid, lon: f64, lat: f64) -> (f64, f64) {
    let lon0 = LON_ORIGIN_DEG.to_radians();
    let ep2 = ell.ep2;

    let n = ell.prime_vertical_radius(lat);
    let t = lat.tan().powi(2);
    let c = ep2 * lat.cos().powi(2);
    let a = (lon - lon0) * lat.cos();
    let m = ell.meridian_arc(lat);

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;
    let a7 = a6 * a;
    let a8 = a7 * a;

    let easting = FALSE_EASTING
        + SCALE
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0
                + (61.0 - 479.0 * t + 179.0 * t * t - t * t * t) * a7 / 5040.0);

    let northing = FALSE_NORTHING
        + SCALE
            * (m + n
                * lat.tan()
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0
                    + (1385.0 - 3111.0 * t + 543.0 * t * t - t * t * t) * a8 / 40320.0));

    (easting, northing)
}

/// Transverse Mercator inverse: easting/northing to geodetic (radians).
fn tm_inverse(ell: &Ellipsoid, easting: f64, northing: f64) -> (f64, f64) {
    let lon0 = LON_ORIGIN_DEG.to_radians();
    let e2 = ell.e2;
    let ep2 = ell.ep2;

    let m = (northing - FALSE_NORTHING) / SCALE;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let mu = m / (ell.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    // Footpoint latitude
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let c1 = ep2 * phi1.cos().powi(2);
    let t1 = phi1.tan().powi(2);
    let n1 = ell.prime_vertical_radius(phi1);
    let r1 = ell.a * (1.0 - e2) / (1.0 - e2 * phi1.sin().powi(2)).powf(1.5);
    let d = (easting - FALSE_EASTING) / (n1 * SCALE);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;
    let d7 = d6 * d;
    let d8 = d7 * d;

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d6
                    / 720.0
                - (1385.0 + 3633.0 * t1 + 4095.0 * t1 * t1 + 1575.0 * t1 * t1 * t1) * d8
                    / 40320.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                / 120.0
            - (61.0 + 662.0 * t1 + 1320.0 * t1 * t1 + 720.0 * t1 * t1 * t1) * d7 / 5040.0)
            / phi1.cos();

    (lon, lat)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    const ROUND_TRIP_TOLERANCE_DEG: f64 = 5.0e-9; // roughly half a millimeter

    fn round_trip(lon: f64, lat: f64) -> (f64, f64) {
        let projector = GreekGridProjector::new();
        let geographic = GeographicPoint::new(lon, lat).unwrap();
        let metric = projector.to_metric_point(&geographic);
        let back = projector.to_geographic_point(&metric);
        ((back.lon() - lon).abs(), (back.lat() - lat).abs())
    }

    #[test]
    fn round_trips_athens_below_a_millimeter() {
        let (dlon, dlat) = round_trip(23.7275, 37.9838);
        assert!(dlon < ROUND_TRIP_TOLERANCE_DEG, "dlon = {dlon}");
        assert!(dlat < ROUND_TRIP_TOLERANCE_DEG, "dlat = {dlat}");
    }

    #[test]
    fn round_trips_across_the_country() {
        // West coast, east Aegean, Crete, north
        for (lon, lat) in [
            (19.92, 39.62),
            (28.22, 36.43),
            (25.13, 35.33),
            (22.94, 40.64),
        ] {
            let (dlon, dlat) = round_trip(lon, lat);
            assert!(dlon < ROUND_TRIP_TOLERANCE_DEG, "({lon},{lat}) dlon = {dlon}");
            assert!(dlat < ROUND_TRIP_TOLERANCE_DEG, "({lon},{lat}) dlat = {dlat}");
        }
    }

    #[test]
    fn athens_lands_in_the_expected_grid_cell() {
        let projector = GreekGridProjector::new();
        let athens = GeographicPoint::new(23.7275, 37.9838).unwrap();
        let metric = projector.to_metric_point(&athens);
        // West of the 24°E central meridian, so easting below 500 km
        assert!(metric.easting() > 450_000.0 && metric.easting() < 500_000.0);
        assert!(metric.northing() > 4_150_000.0 && metric.northing() < 4_250_000.0);
    }

    #[test]
    fn easting_straddles_central_meridian() {
        let projector = GreekGridProjector::new();
        let west = projector.to_metric_point(&GeographicPoint::new(23.9, 38.0).unwrap());
        let east = projector.to_metric_point(&GeographicPoint::new(24.1, 38.0).unwrap());
        assert!(west.easting() < 500_000.0);
        assert!(east.easting() > 500_000.0);
    }

    #[test]
    fn metric_frame_is_meter_true() {
        // 0.001° of latitude is about 111 m on the ground
        let projector = GreekGridProjector::new();
        let a = projector.to_metric_point(&GeographicPoint::new(23.7, 37.900).unwrap());
        let b = projector.to_metric_point(&GeographicPoint::new(23.7, 37.901).unwrap());
        let distance = (a.easting() - b.easting()).hypot(a.northing() - b.northing());
        assert!(
            (distance - 110.9).abs() < 1.5,
            "expected ~110.9 m, got {distance}"
        );
    }

    #[test]
    fn polygon_round_trip_preserves_shape() {
        let projector = GreekGridProjector::new();
        let square = polygon![
            (x: 23.70, y: 37.90),
            (x: 23.71, y: 37.90),
            (x: 23.71, y: 37.91),
            (x: 23.70, y: 37.91),
        ];
        let tagged = GeographicPolygon::new(square.clone()).unwrap();
        let metric = projector.to_metric_polygon(&tagged);
        let back = projector.to_geographic_polygon(&metric);

        let original: Vec<_> = square.exterior().coords().copied().collect();
        let returned: Vec<_> = back.as_polygon().exterior().coords().copied().collect();
        assert_eq!(original.len(), returned.len());
        for (a, b) in original.iter().zip(&returned) {
            assert!((a.x - b.x).abs() < ROUND_TRIP_TOLERANCE_DEG);
            assert!((a.y - b.y).abs() < ROUND_TRIP_TOLERANCE_DEG);
        }
    }
}
