//! Shapefile ingestion: PRODES exports and the IBGE municipal mesh.
//!
//! Reads `.shp` geometry and `.dbf` attributes into a [`GeoTable`]. Only
//! polygonal shapes are kept; the attribute table's column types follow the
//! first record (dBase fields are either numeric or text for our inputs).
//! Shapefiles do not carry an EPSG code in-band, so the caller supplies it.

use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::frame::DataFrame;
use polars::prelude::NamedFrom;
use polars::series::Series;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};

use crate::table::GeoTable;

/// Read all polygonal shapes + attribute records from a `.shp` path.
pub fn read_shapefile(path: &Path, epsg: Option<u32>) -> Result<GeoTable> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("[io::shapefile] Failed to open shapefile: {}", path.display()))?;

    let mut geoms = Vec::new();
    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shapefile] Error reading shape+record")?;
        let Some(geom) = shape_to_multipolygon(shape) else { continue };
        geoms.push(geom);
        records.push(record);
    }

    let table = records_to_frame(&records)
        .with_context(|| format!("[io::shapefile] Bad attribute table in {}", path.display()))?;
    GeoTable::new(geoms, table, epsg)
}

/// Convert a polygonal shape to `geo::MultiPolygon`; `None` for other kinds.
fn shape_to_multipolygon(shape: Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(group_rings(p.rings().iter().map(|ring| {
            let coords = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        }))),
        Shape::PolygonZ(p) => Some(group_rings(p.rings().iter().map(|ring| {
            let coords = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        }))),
        Shape::PolygonM(p) => Some(group_rings(p.rings().iter().map(|ring| {
            let coords = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
            (matches!(ring, PolygonRing::Outer(_)), coords)
        }))),
        _ => None,
    }
}

/// Group shapefile rings into polygons: each outer ring owns the inner
/// rings that follow it (the order shapefiles store them in). An inner ring
/// before any outer ring is malformed and dropped. `geo::Polygon` closes
/// open rings on construction.
fn group_rings(rings: impl Iterator<Item = (bool, Vec<Coord<f64>>)>) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    for (is_outer, coords) in rings {
        let ring = LineString::from(coords);
        if is_outer {
            polys.push(Polygon::new(ring, Vec::new()));
        } else if let Some(poly) = polys.last_mut() {
            poly.interiors_push(ring);
        }
    }
    MultiPolygon(polys)
}

/// Build the attribute DataFrame. Row `i` corresponds to geometry `i`.
fn records_to_frame(records: &[Record]) -> Result<DataFrame> {
    let Some(first) = records.first() else {
        return Ok(DataFrame::empty());
    };
    let names: Vec<String> = first.clone().into_iter().map(|(name, _)| name).collect();

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let numeric = matches!(
            first.get(name),
            Some(
                FieldValue::Numeric(_)
                    | FieldValue::Float(_)
                    | FieldValue::Integer(_)
                    | FieldValue::Double(_)
                    | FieldValue::Currency(_)
            )
        );
        let column = if numeric {
            let values: Vec<Option<f64>> =
                records.iter().map(|record| numeric_value(record.get(name))).collect();
            Series::new(name.as_str().into(), values).into()
        } else {
            let values: Vec<Option<String>> =
                records.iter().map(|record| text_value(record.get(name))).collect();
            Series::new(name.as_str().into(), values).into()
        };
        columns.push(column);
    }
    DataFrame::new(columns).map_err(Into::into)
}

fn numeric_value(value: Option<&FieldValue>) -> Option<f64> {
    match value {
        Some(FieldValue::Numeric(v)) => *v,
        Some(FieldValue::Float(v)) => v.map(f64::from),
        Some(FieldValue::Integer(v)) => Some(f64::from(*v)),
        Some(FieldValue::Double(v)) => Some(*v),
        Some(FieldValue::Currency(v)) => Some(*v),
        _ => None,
    }
}

fn text_value(value: Option<&FieldValue>) -> Option<String> {
    match value {
        Some(FieldValue::Character(v)) => v.clone(),
        Some(FieldValue::Memo(v)) => Some(v.clone()),
        Some(FieldValue::Logical(v)) => v.map(|b| b.to_string()),
        Some(FieldValue::Date(v)) => {
            v.map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            Coord { x, y },
            Coord { x: x + size, y },
            Coord { x: x + size, y: y + size },
            Coord { x, y: y + size },
            Coord { x, y },
        ]
    }

    #[test]
    fn outer_ring_owns_following_inner_rings() {
        let rings = vec![
            (true, square(0.0, 0.0, 10.0)),
            (false, square(1.0, 1.0, 1.0)),
            (true, square(20.0, 20.0, 5.0)),
        ];
        let mp = group_rings(rings.into_iter());
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[1].interiors().len(), 0);
    }

    #[test]
    fn orphan_inner_ring_is_dropped() {
        let rings = vec![(false, square(0.0, 0.0, 1.0)), (true, square(5.0, 5.0, 1.0))];
        let mp = group_rings(rings.into_iter());
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 0);
    }
}
