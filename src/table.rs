use anyhow::{Result, ensure};
use geo::MultiPolygon;
use polars::frame::DataFrame;

/// A vector layer: one geometry per attribute-table row, plus the EPSG code
/// of the coordinate reference system the geometries are expressed in.
///
/// Row `i` of `table` describes `geoms[i]`. The pipeline never mutates a
/// caller's GeoTable; every transformation produces derived collections.
#[derive(Debug, Clone)]
pub struct GeoTable {
    geoms: Vec<MultiPolygon<f64>>,
    table: DataFrame,
    epsg: Option<u32>,
}

impl GeoTable {
    /// Construct a GeoTable from parallel geometry and attribute rows.
    pub fn new(geoms: Vec<MultiPolygon<f64>>, table: DataFrame, epsg: Option<u32>) -> Result<Self> {
        ensure!(
            geoms.len() == table.height(),
            "geometry count ({}) does not match attribute row count ({})",
            geoms.len(),
            table.height(),
        );
        Ok(Self { geoms, table, epsg })
    }

    /// Number of features.
    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    /// Check if the layer has no features.
    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    /// Get a reference to the geometry column.
    #[inline] pub fn geoms(&self) -> &[MultiPolygon<f64>] { &self.geoms }

    /// Get a reference to the attribute table.
    #[inline] pub fn table(&self) -> &DataFrame { &self.table }

    /// EPSG code of the layer's CRS, if known.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }
}
