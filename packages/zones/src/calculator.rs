//! Per-record no-swim zone computation.
//!
//! Each plant is processed independently: resolve the discharge point,
//! buffer it by the fixed radius in the metric frame, reproject, and
//! subtract the unified reference geometry. Failures are absorbed into a
//! typed per-record outcome so one bad record never aborts the batch.

use coastwatch_models::{NoSwimZone, PlantRecord, SkipReason};
use coastwatch_projection::{GeographicPoint, GreekGridProjector};
use wkt::TryFromWkt;

use crate::regions::ReferenceGeometry;

/// Buffer radius around each discharge point, meters. System-wide constant,
/// not per-record configurable.
pub const BUFFER_RADIUS_METERS: f64 = 200.0;

/// Vertices in the buffer disk tessellation (fixed, for reproducibility).
const BUFFER_SEGMENTS: usize = 64;

/// The typed result of processing one plant record.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneOutcome {
    /// The buffer extends beyond the reference geometry; a zone was derived.
    Zone(NoSwimZone),
    /// The buffer lies entirely inside the reference geometry (e.g. an
    /// inland plant). Expected, silently omitted from output.
    Empty,
    /// The record had no usable discharge point.
    Skipped(SkipReason),
}

/// Computes no-swim zones for plant records against a fixed reference
/// geometry.
///
/// Holds only shared read-only state, so records can be processed in any
/// order (or concurrently) with identical results.
#[derive(Debug, Clone, Copy)]
pub struct ZoneCalculator<'a> {
    projector: &'a GreekGridProjector,
    reference: &'a ReferenceGeometry,
}

impl<'a> ZoneCalculator<'a> {
    /// Creates a calculator borrowing the run's shared projector and
    /// reference geometry.
    #[must_use]
    pub const fn new(projector: &'a GreekGridProjector, reference: &'a ReferenceGeometry) -> Self {
        Self {
            projector,
            reference,
        }
    }

    /// Derives the no-swim zone for one plant record.
    ///
    /// Never fails: unusable records come back as
    /// [`ZoneOutcome::Skipped`] and are logged, not propagated.
    #[must_use]
    pub fn zone_for(&self, record: &PlantRecord) -> ZoneOutcome {
        let point = match discharge_point(record) {
            Ok(point) => point,
            Err(reason) => {
                log::warn!("Skipping plant '{}': {reason}", record.label());
                return ZoneOutcome::Skipped(reason);
            }
        };

        let metric = self.projector.to_metric_point(&point);
        let disk = metric.buffer(BUFFER_RADIUS_METERS, BUFFER_SEGMENTS);
        let disk_geographic = self.projector.to_geographic_polygon(&disk);

        let zone_geometry = disk_geographic.difference(self.reference.boundary());
        if zone_geometry.is_empty() {
            log::debug!(
                "Plant '{}': buffer entirely within reference geometry, no zone",
                record.label()
            );
            return ZoneOutcome::Empty;
        }

        ZoneOutcome::Zone(NoSwimZone::from_record(record, zone_geometry))
    }
}

/// Resolves the discharge point for a record: the well-known-text geometry
/// is preferred; a parse failure falls back to the lat/long pair (logged).
fn discharge_point(record: &PlantRecord) -> Result<GeographicPoint, SkipReason> {
    if let Some(wkt_text) = record.receiver_location.as_deref() {
        match geo::Point::<f64>::try_from_wkt_str(wkt_text) {
            Ok(point) => {
                return GeographicPoint::new(point.x(), point.y())
                    .map_err(|_| SkipReason::NonFiniteCoordinates);
            }
            Err(e) => {
                log::warn!(
                    "Plant '{}': unparseable receiver location '{wkt_text}' ({e}), \
                     falling back to lat/long",
                    record.label()
                );
            }
        }
    }

    match (record.longitude, record.latitude) {
        (Some(lon), Some(lat)) => {
            GeographicPoint::new(lon, lat).map_err(|_| SkipReason::NonFiniteCoordinates)
        }
        _ => Err(SkipReason::MissingCoordinates),
    }
}

#[cfg(test)]
mod tests {
    use coastwatch_projection::GeographicMultiPolygon;
    use geo::{Area, Centroid, MultiPolygon, polygon};

    use super::*;

    fn reference_square(x0: f64, y0: f64, size: f64) -> ReferenceGeometry {
        let p = polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ];
        ReferenceGeometry::new(GeographicMultiPolygon::new(MultiPolygon(vec![p])).unwrap())
    }

    fn record_at(lon: f64, lat: f64) -> PlantRecord {
        PlantRecord {
            name: Some("test plant".to_string()),
            longitude: Some(lon),
            latitude: Some(lat),
            ..PlantRecord::default()
        }
    }

    #[test]
    fn open_water_point_yields_the_full_disk() {
        let projector = GreekGridProjector::new();
        // Reference far to the west; the 200 m buffer cannot touch it
        let reference = reference_square(20.0, 37.0, 0.5);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let outcome = calculator.zone_for(&record_at(23.7, 37.9));
        let ZoneOutcome::Zone(zone) = outcome else {
            panic!("expected a zone, got {outcome:?}");
        };

        let disk = projector
            .to_metric_point(&GeographicPoint::new(23.7, 37.9).unwrap())
            .buffer(BUFFER_RADIUS_METERS, 64);
        let disk_area = projector
            .to_geographic_polygon(&disk)
            .as_polygon()
            .unsigned_area();
        let zone_area = zone.geometry.as_multi_polygon().unsigned_area();
        let relative = (zone_area - disk_area).abs() / disk_area;
        assert!(relative < 1e-6, "relative area difference {relative}");
    }

    #[test]
    fn point_deep_inside_reference_yields_empty() {
        let projector = GreekGridProjector::new();
        // 1-degree square centered well around the plant; 200 m cannot escape
        let reference = reference_square(23.2, 37.4, 1.0);
        let calculator = ZoneCalculator::new(&projector, &reference);

        assert_eq!(
            calculator.zone_for(&record_at(23.7, 37.9)),
            ZoneOutcome::Empty
        );
    }

    #[test]
    fn record_without_coordinates_is_skipped() {
        let projector = GreekGridProjector::new();
        let reference = reference_square(23.2, 37.4, 1.0);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let record = PlantRecord {
            name: Some("no coords".to_string()),
            ..PlantRecord::default()
        };
        assert_eq!(
            calculator.zone_for(&record),
            ZoneOutcome::Skipped(SkipReason::MissingCoordinates)
        );
    }

    #[test]
    fn wkt_location_is_preferred_over_lat_long() {
        let projector = GreekGridProjector::new();
        let reference = reference_square(20.0, 37.0, 0.1);
        let calculator = ZoneCalculator::new(&projector, &reference);

        // WKT at 24.5/38.5; the lat/long fields point somewhere else entirely
        let record = PlantRecord {
            receiver_location: Some("POINT (24.5 38.5)".to_string()),
            ..record_at(21.0, 36.0)
        };
        let ZoneOutcome::Zone(zone) = calculator.zone_for(&record) else {
            panic!("expected a zone");
        };
        let centroid = zone.geometry.as_multi_polygon().centroid().unwrap();
        assert!((centroid.x() - 24.5).abs() < 0.01);
        assert!((centroid.y() - 38.5).abs() < 0.01);
    }

    #[test]
    fn unparseable_wkt_falls_back_to_lat_long() {
        let projector = GreekGridProjector::new();
        let reference = reference_square(20.0, 37.0, 0.1);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let record = PlantRecord {
            receiver_location: Some("POINT (sea)".to_string()),
            ..record_at(23.7, 37.9)
        };
        let ZoneOutcome::Zone(zone) = calculator.zone_for(&record) else {
            panic!("expected a zone");
        };
        let centroid = zone.geometry.as_multi_polygon().centroid().unwrap();
        assert!((centroid.x() - 23.7).abs() < 0.01);
        assert!((centroid.y() - 37.9).abs() < 0.01);
    }

    #[test]
    fn wkt_only_record_is_usable() {
        let projector = GreekGridProjector::new();
        let reference = reference_square(20.0, 37.0, 0.1);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let record = PlantRecord {
            name: Some("wkt only".to_string()),
            receiver_location: Some("POINT (23.7 37.9)".to_string()),
            ..PlantRecord::default()
        };
        assert!(matches!(
            calculator.zone_for(&record),
            ZoneOutcome::Zone(_)
        ));
    }

    #[test]
    fn coastal_notch_zone_stays_outside_the_reference() {
        let projector = GreekGridProjector::new();
        // Mainland east of the plant; the western half of the buffer is open
        // water
        let reference = reference_square(23.7, 37.4, 1.0);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let ZoneOutcome::Zone(zone) = calculator.zone_for(&record_at(23.7, 37.9)) else {
            panic!("expected a zone");
        };
        // Roughly half the disk survives
        let centroid = zone.geometry.as_multi_polygon().centroid().unwrap();
        assert!(centroid.x() < 23.7, "zone should lie west of the coastline");
    }

    #[test]
    fn buffer_disk_area_approximates_a_circle() {
        let projector = GreekGridProjector::new();
        let metric = projector.to_metric_point(&GeographicPoint::new(23.7, 37.9).unwrap());
        let disk = metric.buffer(BUFFER_RADIUS_METERS, 64);
        let area = disk.as_polygon().unsigned_area();
        let circle = std::f64::consts::PI * BUFFER_RADIUS_METERS * BUFFER_RADIUS_METERS;
        // A 64-gon underestimates the circle by ~0.16%
        assert!(area < circle);
        assert!(area > 0.995 * circle, "area = {area}, circle = {circle}");
    }

    #[test]
    fn compliance_flag_defaults_to_true() {
        let projector = GreekGridProjector::new();
        let reference = reference_square(20.0, 37.0, 0.1);
        let calculator = ZoneCalculator::new(&projector, &reference);

        let ZoneOutcome::Zone(zone) = calculator.zone_for(&record_at(23.7, 37.9)) else {
            panic!("expected a zone");
        };
        assert!(zone.compliance);
    }
}
