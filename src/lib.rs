//! Aggregation of PRODES deforestation polygons into per-municipality,
//! per-year deforested area for one Brazilian state.

mod error;
mod pipeline;
mod schema;
mod table;

pub mod cli;
pub mod commands;
pub mod io;

#[cfg(feature = "download")]
pub(crate) mod common;

#[doc(inline)]
pub use error::PipelineError;

#[doc(inline)]
pub use pipeline::{
    AREA_EPSG, AggregationMode, CrsAction, JoinOutcome, JoinedRecord, LABEL_YEAR_PATTERN,
    Pipeline, PipelineConfig, PipelineOutput, RunReport, UNKNOWN_BOUNDARY, YEAR_FLOOR,
    filter_by_region,
};

#[doc(inline)]
pub use schema::{Attribute, require, resolve};

#[doc(inline)]
pub use table::GeoTable;
