//! Coordinate reference handling.
//!
//! Every CRS the pipeline accepts is listed in an explicit EPSG → PROJ.4
//! table; anything else is rejected rather than silently assumed. The
//! boundary layer is the reference of record: when the two input layers
//! disagree, deforestation features are reprojected into the boundary CRS
//! before any spatial predicate runs, and the action taken is recorded in
//! the run report.

use anyhow::Result;
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use serde::Serialize;

use crate::error::PipelineError;

/// A resolved coordinate reference system.
pub(crate) struct CrsDef {
    pub(crate) epsg: u32,
    proj: Proj4,
    // Geographic CRS coordinates are degrees; proj4rs wants radians.
    geographic: bool,
}

/// What the CRS Normalizer did to the deforestation layer, for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CrsAction {
    /// No boundary layer to align with (degraded runs).
    NotRequired,
    /// Both layers already share one CRS.
    NoOp { epsg: u32 },
    /// Features were reprojected into the boundary CRS.
    Reprojected { from: u32, to: u32 },
}

/// Resolve an EPSG code against the supported CRS table.
pub(crate) fn lookup(epsg: u32) -> Result<CrsDef, PipelineError> {
    let (proj_string, geographic) = match epsg {
        // Geographic
        4326 => ("+proj=longlat +datum=WGS84 +no_defs +type=crs", true),
        4269 => ("+proj=longlat +datum=NAD83 +no_defs +type=crs", true),
        // SAD69 (legacy PRODES vintages)
        4618 => (
            "+proj=longlat +ellps=aust_SA +towgs84=-66.87,4.37,-38.52 +no_defs +type=crs",
            true,
        ),
        // SIRGAS 2000, the native CRS of PRODES and the IBGE mesh
        4674 => ("+proj=longlat +ellps=GRS80 +towgs84=0,0,0 +no_defs +type=crs", true),
        // WGS 84 / NSIDC EASE-Grid 2.0 Global (Lambert cylindrical
        // equal-area), the area-measurement CRS
        6933 => (
            "+proj=cea +lat_ts=30 +lon_0=0 +x_0=0 +y_0=0 \
             +datum=WGS84 +units=m +no_defs +type=crs",
            false,
        ),
        _ => return Err(PipelineError::UnsupportedCrs(epsg)),
    };
    let proj = Proj4::from_proj_string(proj_string)
        .map_err(|_| PipelineError::UnsupportedCrs(epsg))?;
    Ok(CrsDef { epsg, proj, geographic })
}

/// Reproject one geometry between two resolved reference systems.
///
/// Returns a new geometry; the input is never mutated. Fails on
/// non-convergent or non-finite transforms, which callers treat as an
/// invalid geometry (skip and count, never abort the run).
pub(crate) fn reproject(
    geom: &MultiPolygon<f64>,
    from: &CrsDef,
    to: &CrsDef,
) -> Result<MultiPolygon<f64>> {
    geom.try_map_coords(|coord: Coord<f64>| {
        let mut point = if from.geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&from.proj, &to.proj, &mut point)?;
        let (x, y) = if to.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        anyhow::ensure!(x.is_finite() && y.is_finite(), "non-finite coordinate after transform");
        Ok(Coord { x, y })
    })
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    #[test]
    fn unknown_epsg_is_rejected() {
        assert!(matches!(lookup(31337), Err(PipelineError::UnsupportedCrs(31337))));
    }

    #[test]
    fn supported_table_resolves() {
        for epsg in [4326, 4269, 4618, 4674, 6933] {
            assert_eq!(lookup(epsg).unwrap().epsg, epsg);
        }
    }

    #[test]
    fn sirgas_to_wgs84_is_near_identity() {
        // Both datums share the GRS80/WGS84 frame to within millimetres.
        let from = lookup(4674).unwrap();
        let to = lookup(4326).unwrap();
        let geom = MultiPolygon(vec![polygon![
            (x: -48.5, y: -1.45),
            (x: -48.4, y: -1.45),
            (x: -48.4, y: -1.35),
            (x: -48.5, y: -1.35),
        ]]);
        let out = reproject(&geom, &from, &to).unwrap();
        let a = geom.0[0].exterior().0[0];
        let b = out.0[0].exterior().0[0];
        assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
    }

    #[test]
    fn geographic_to_equal_area_lands_in_meters() {
        let from = lookup(4674).unwrap();
        let to = lookup(6933).unwrap();
        let geom = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: -54.0, y: 0.0),
            (x: -54.0, y: 0.1),
            (x: 0.0, y: 0.1),
        ]]);
        let out = reproject(&geom, &from, &to).unwrap();
        let exterior = &out.0[0].exterior().0;
        // Projection origin maps onto the grid origin.
        assert!(exterior[0].x.abs() < 1.0 && exterior[0].y.abs() < 1.0);
        // x = a * k0 * lambda for a cylindrical equal-area grid:
        // 6378137 m * 0.866751 * (-54°) ≈ -5_210_260 m, equator stays y = 0.
        assert!((exterior[1].x - (-5_210_260.0)).abs() < 1_000.0);
        assert!(exterior[1].y.abs() < 1.0);
    }
}
