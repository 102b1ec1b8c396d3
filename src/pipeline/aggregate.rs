//! Grouped aggregation into the output table.

use ahash::AHashMap;
use polars::frame::DataFrame;
use polars::prelude::{NamedFrom, PolarsResult};
use polars::series::Series;

use super::join::JoinedRecord;
use super::{Boundary, Feature};

/// Sentinel boundary identifier for year-only (degraded) aggregation.
pub const UNKNOWN_BOUNDARY: &str = "UNKNOWN";

/// Group joined records by (boundary, year), summing per-feature area.
///
/// Records whose feature has no measurable area (`None`) are skipped; a
/// feature spanning several boundaries contributes its full area to each.
pub(crate) fn by_boundary(
    records: &[JoinedRecord],
    features: &[Feature],
    boundaries: &[Boundary],
    areas: &[Option<f64>],
) -> Vec<(String, i32, f64)> {
    let mut acc: AHashMap<(&str, i32), f64> = AHashMap::new();
    for record in records {
        let Some(area) = areas[record.feature] else { continue };
        let key = (boundaries[record.boundary].id.as_str(), features[record.feature].year);
        *acc.entry(key).or_insert(0.0) += area;
    }
    acc.into_iter().map(|((id, year), area)| (id.to_string(), year, area)).collect()
}

/// Degraded mode: group every feature by year alone under the sentinel
/// boundary identifier. Only features with no measurable area are dropped.
pub(crate) fn by_year(features: &[Feature], areas: &[Option<f64>]) -> Vec<(String, i32, f64)> {
    let mut acc: AHashMap<i32, f64> = AHashMap::new();
    for (feature, area) in features.iter().zip(areas) {
        let Some(area) = area else { continue };
        *acc.entry(feature.year).or_insert(0.0) += area;
    }
    acc.into_iter().map(|(year, area)| (UNKNOWN_BOUNDARY.to_string(), year, area)).collect()
}

/// Materialize rows as the output table: `boundary_id`, `year`, `area_km2`.
///
/// Row order is not part of the contract; rows are key-sorted here so that
/// repeated runs produce byte-identical CSVs.
pub(crate) fn to_frame(mut rows: Vec<(String, i32, f64)>) -> PolarsResult<DataFrame> {
    rows.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

    let (ids, years, areas) = rows.into_iter().fold(
        (Vec::new(), Vec::new(), Vec::new()),
        |(mut ids, mut years, mut areas), (id, year, area)| {
            ids.push(id);
            years.push(year);
            areas.push(area);
            (ids, years, areas)
        },
    );

    DataFrame::new(vec![
        Series::new("boundary_id".into(), ids).into(),
        Series::new("year".into(), years).into(),
        Series::new("area_km2".into(), areas).into(),
    ])
}

/// The empty output table, with the full schema.
pub(crate) fn empty_frame() -> PolarsResult<DataFrame> {
    to_frame(Vec::new())
}
