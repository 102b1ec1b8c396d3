//! Equal-area measurement.
//!
//! Areas are always measured in a fixed equal-area projection (EPSG:6933
//! by default, Lambert cylindrical equal-area), regardless of the CRS the
//! rest of the pipeline is working in. The reprojection here is local to
//! the measurement and never feeds back into the pipeline's stored
//! geometries.

use anyhow::Result;
use geo::{Area, MultiPolygon};

use super::crs::{self, CrsDef};

/// Planar area of `geom` in square kilometers, measured under `measure`.
///
/// Always ≥ 0. Degenerate (zero-area) geometries yield 0, not an error;
/// a failed transform or a non-finite result (geometries carrying NaN or
/// infinite coordinates) is an error, which callers count as an invalid
/// geometry.
pub(crate) fn area_km2(
    geom: &MultiPolygon<f64>,
    from: &CrsDef,
    measure: &CrsDef,
) -> Result<f64> {
    let m2 = if from.epsg == measure.epsg {
        geom.unsigned_area()
    } else {
        crs::reproject(geom, from, measure)?.unsigned_area()
    };
    anyhow::ensure!(m2.is_finite(), "non-finite area");
    Ok(m2 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn crs(epsg: u32) -> CrsDef {
        crs::lookup(epsg).unwrap()
    }

    #[test]
    fn equatorial_square_measures_about_right() {
        // 0.01° x 0.01° near the equator is roughly 1.113 km x 1.113 km.
        let geom = MultiPolygon(vec![polygon![
            (x: -48.50, y: -1.45),
            (x: -48.49, y: -1.45),
            (x: -48.49, y: -1.44),
            (x: -48.50, y: -1.44),
        ]]);
        let km2 = area_km2(&geom, &crs(4674), &crs(6933)).unwrap();
        assert!(km2 > 1.15 && km2 < 1.35, "got {km2}");
    }

    #[test]
    fn degenerate_geometry_yields_zero() {
        let empty = MultiPolygon::<f64>(vec![]);
        assert_eq!(area_km2(&empty, &crs(4674), &crs(6933)).unwrap(), 0.0);

        // Zero-width sliver.
        let sliver = MultiPolygon(vec![polygon![
            (x: -48.5, y: -1.45),
            (x: -48.4, y: -1.45),
            (x: -48.5, y: -1.45),
        ]]);
        assert_eq!(area_km2(&sliver, &crs(4674), &crs(6933)).unwrap(), 0.0);
    }

    #[test]
    fn same_crs_skips_the_measurement_reprojection() {
        // Already in the measurement CRS: plain shoelace in meters.
        let geom = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1_000.0, y: 0.0),
            (x: 1_000.0, y: 1_000.0),
            (x: 0.0, y: 1_000.0),
        ]]);
        let km2 = area_km2(&geom, &crs(6933), &crs(6933)).unwrap();
        assert!((km2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_coordinates_are_an_error_on_both_paths() {
        let geom = MultiPolygon(vec![polygon![
            (x: f64::NAN, y: 0.0),
            (x: 1_000.0, y: 0.0),
            (x: 1_000.0, y: 1_000.0),
        ]]);
        // Same-CRS shortcut: the shoelace sum is NaN and must not leak.
        assert!(area_km2(&geom, &crs(6933), &crs(6933)).is_err());
        // Reprojecting path: the transform refuses the coordinate.
        assert!(area_km2(&geom, &crs(4674), &crs(6933)).is_err());
    }
}
