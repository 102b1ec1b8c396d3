//! The spatial-temporal aggregation pipeline.
//!
//! One call processes one complete pair of input collections to completion:
//! resolve schema → filter to the target region → derive years → normalize
//! CRS → spatially join → measure area → aggregate. The run either returns
//! the output table (plus an auditable report) or fails with one
//! [`PipelineError`] naming the precondition that broke. Geometry-level
//! trouble never aborts: bad features are skipped and counted, and a failed
//! join degrades to year-only aggregation.

mod aggregate;
mod area;
mod crs;
pub(crate) mod filter;
mod join;
mod temporal;

pub use aggregate::UNKNOWN_BOUNDARY;
pub use crs::CrsAction;
pub use filter::filter_by_region;
pub use join::{JoinOutcome, JoinedRecord};

use geo::MultiPolygon;
use polars::frame::DataFrame;
use polars::prelude::DataType;
use regex::Regex;
use serde::Serialize;

use crate::error::PipelineError;
use crate::schema::{self, Attribute};
use crate::table::GeoTable;

/// Start of PRODES' valid temporal range; earlier events are incremental
/// baseline noise and are dropped.
pub const YEAR_FLOOR: i32 = 2008;

/// Default label pattern. Capture group 1 must be the four-digit year.
pub const LABEL_YEAR_PATTERN: &str = r"d(\d{4})";

/// WGS 84 / NSIDC EASE-Grid 2.0 Global (Lambert cylindrical equal-area),
/// the default area-measurement CRS.
pub const AREA_EPSG: u32 = 6933;

/// One deforestation-change record, after schema resolution.
#[derive(Debug, Clone)]
pub(crate) struct Feature {
    pub(crate) geom: MultiPolygon<f64>,
    pub(crate) year: i32,
}

/// One administrative unit, pre-filtered to the target region.
#[derive(Debug, Clone)]
pub(crate) struct Boundary {
    pub(crate) id: String,
    pub(crate) geom: MultiPolygon<f64>,
}

/// Explicit pipeline parameters. No global state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Region code features and boundaries must carry (e.g. `"PA"`).
    pub target_region: String,
    /// Features dated before this year are dropped.
    pub year_floor: i32,
    /// Year-extraction pattern applied to the label column.
    pub label_pattern: Regex,
    /// Equal-area reference used for measurement.
    pub area_epsg: u32,
}

impl PipelineConfig {
    /// Config with the dataset defaults for a given target region.
    pub fn new(target_region: impl Into<String>) -> Self {
        Self {
            target_region: target_region.into(),
            year_floor: YEAR_FLOOR,
            label_pattern: Regex::new(LABEL_YEAR_PATTERN).expect("default label pattern is valid"),
            area_epsg: AREA_EPSG,
        }
    }
}

/// Which grouping the aggregator used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Normal mode: grouped by (boundary, year).
    ByBoundary,
    /// Degraded mode: grouped by year under the `"UNKNOWN"` sentinel.
    ByYearOnly,
}

/// Audit trail of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Features in the input collection.
    pub input_features: usize,
    /// Features matching the target region (0 means the run short-circuited
    /// to an empty table without aggregating).
    pub region_matches: usize,
    /// Features that survived year derivation and the year floor.
    pub dated_features: usize,
    /// What the CRS normalizer did.
    pub crs: CrsAction,
    /// Aggregation mode, `None` when aggregation never ran.
    pub mode: Option<AggregationMode>,
    /// Features excluded as invalid (failed reprojection or measurement).
    pub skipped_invalid: usize,
    /// Cause of a caught spatial-join failure, if the run degraded.
    pub join_failure: Option<String>,
    /// Rows in the output table.
    pub output_rows: usize,
}

/// A finished run: the output table and its report.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Columns: `boundary_id` (str), `year` (i32), `area_km2` (f64).
    pub table: DataFrame,
    pub report: RunReport,
}

/// The aggregation engine. Stateless between runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Process one batch of deforestation features against an optional
    /// boundary collection.
    ///
    /// Caller-owned collections are borrowed and never mutated; every
    /// transformation works on derived copies.
    pub fn run(
        &self,
        features: &GeoTable,
        boundaries: Option<&GeoTable>,
    ) -> Result<PipelineOutput, PipelineError> {
        let cfg = &self.config;
        let input_features = features.len();

        // Region filter. An empty match is the caller's policy call; here
        // the policy is a reported empty table, never a run on empty input.
        let kept = match filter::filter_by_region(features.table(), &cfg.target_region) {
            Ok(kept) => kept,
            Err(PipelineError::NoMatchingRegion { .. }) => {
                return Ok(PipelineOutput {
                    table: aggregate::empty_frame()?,
                    report: RunReport {
                        input_features,
                        region_matches: 0,
                        dated_features: 0,
                        crs: CrsAction::NotRequired,
                        mode: None,
                        skipped_invalid: 0,
                        join_failure: None,
                        output_rows: 0,
                    },
                });
            }
            Err(err) => return Err(err),
        };
        let region_matches = kept.len();

        // Year derivation + floor; undatable features are dropped.
        let years = temporal::derive_years(features.table(), &cfg.label_pattern, cfg.year_floor)?;
        let feats: Vec<Feature> = kept
            .into_iter()
            .filter_map(|idx| {
                years[idx].map(|year| Feature { geom: features.geoms()[idx].clone(), year })
            })
            .collect();

        // Area measurement always needs a defined source CRS, joined or not.
        let feature_epsg = features
            .epsg()
            .ok_or(PipelineError::UndefinedCrs { collection: "deforestation" })?;
        let feature_crs = crs::lookup(feature_epsg)?;
        let measure_crs = crs::lookup(cfg.area_epsg)?;

        let mut area_failed = vec![false; feats.len()];
        let areas: Vec<Option<f64>> = feats
            .iter()
            .enumerate()
            .map(|(idx, feature)| {
                match area::area_km2(&feature.geom, &feature_crs, &measure_crs) {
                    Ok(area) => Some(area),
                    Err(_) => {
                        area_failed[idx] = true;
                        None
                    }
                }
            })
            .collect();

        let resolved = match boundaries {
            Some(layer) if !layer.is_empty() => self.resolve_boundaries(layer)?,
            _ => None,
        };

        // Normalize CRS and join, or bypass into degraded mode.
        let mut reproject_failed = vec![false; feats.len()];
        let (outcome, crs_action, bounds) = match resolved {
            None => (JoinOutcome::Unavailable, CrsAction::NotRequired, Vec::new()),
            Some((bounds, boundary_crs)) => {
                let (aligned, action) = if feature_crs.epsg == boundary_crs.epsg {
                    let aligned = feats.iter().map(|f| Some(f.geom.clone())).collect::<Vec<_>>();
                    (aligned, CrsAction::NoOp { epsg: feature_crs.epsg })
                } else {
                    let aligned = feats
                        .iter()
                        .enumerate()
                        .map(|(idx, feature)| {
                            match crs::reproject(&feature.geom, &feature_crs, &boundary_crs) {
                                Ok(geom) => Some(geom),
                                Err(_) => {
                                    reproject_failed[idx] = true;
                                    None
                                }
                            }
                        })
                        .collect::<Vec<_>>();
                    let action = CrsAction::Reprojected {
                        from: feature_crs.epsg,
                        to: boundary_crs.epsg,
                    };
                    (aligned, action)
                };
                (join::spatial_join(&aligned, &bounds), action, bounds)
            }
        };

        // The mode is chosen exactly once, here; the two modes never mix.
        let (mode, rows, join_failure, skipped_invalid) = match outcome {
            JoinOutcome::Joined(records) => {
                let skipped = area_failed
                    .iter()
                    .zip(&reproject_failed)
                    .filter(|(area, reproject)| **area || **reproject)
                    .count();
                let rows = aggregate::by_boundary(&records, &feats, &bounds, &areas);
                (AggregationMode::ByBoundary, rows, None, skipped)
            }
            JoinOutcome::Unavailable => {
                let skipped = area_failed.iter().filter(|failed| **failed).count();
                (AggregationMode::ByYearOnly, aggregate::by_year(&feats, &areas), None, skipped)
            }
            JoinOutcome::Failed(cause) => {
                let skipped = area_failed.iter().filter(|failed| **failed).count();
                let rows = aggregate::by_year(&feats, &areas);
                (AggregationMode::ByYearOnly, rows, Some(cause), skipped)
            }
        };

        let table = aggregate::to_frame(rows)?;
        Ok(PipelineOutput {
            report: RunReport {
                input_features,
                region_matches,
                dated_features: feats.len(),
                crs: crs_action,
                mode: Some(mode),
                skipped_invalid,
                join_failure,
                output_rows: table.height(),
            },
            table,
        })
    }

    /// Resolve boundary attribution columns and pre-filter to the target
    /// region. `Ok(None)` means no usable boundary remains and the join is
    /// bypassed; unresolvable columns stay fatal.
    fn resolve_boundaries(
        &self,
        layer: &GeoTable,
    ) -> Result<Option<(Vec<Boundary>, crs::CrsDef)>, PipelineError> {
        let table = layer.table();
        let id_column = schema::require(table, Attribute::BoundaryId)?;
        let region_column = schema::require(table, Attribute::RegionCode)?;
        let mask = filter::region_mask(table, region_column, &self.config.target_region)?;

        let ids = table.column(id_column)?.cast(&DataType::String)?;
        let ids = ids.str()?;
        let bounds: Vec<Boundary> = mask
            .into_iter()
            .filter_map(|idx| {
                ids.get(idx)
                    .map(|id| Boundary { id: id.to_string(), geom: layer.geoms()[idx].clone() })
            })
            .collect();
        if bounds.is_empty() {
            return Ok(None);
        }

        let epsg = layer.epsg().ok_or(PipelineError::UndefinedCrs { collection: "boundary" })?;
        Ok(Some((bounds, crs::lookup(epsg)?)))
    }
}
