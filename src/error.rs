use thiserror::Error;

/// Errors that can abort a pipeline run.
///
/// Schema- and precondition-level failures are fatal: they mean the input is
/// fundamentally unusable for this run. Geometry- and join-level failures are
/// NOT represented here — they degrade the run instead (see
/// [`crate::pipeline::JoinOutcome`]) and are tallied in the run report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required canonical attribute has no matching input column.
    #[error("no input column matches any known alias for `{attribute}`")]
    ColumnNotFound { attribute: &'static str },

    /// The deforestation input has no resolvable region-code column.
    #[error("deforestation input has no resolvable region-code column")]
    MissingRegionColumn,

    /// Region filtering produced zero features. Callers decide whether this
    /// is fatal; `Pipeline::run` short-circuits to an empty output table.
    #[error("no feature matches target region `{region}`")]
    NoMatchingRegion { region: String },

    /// Neither a direct year column nor a class label to derive it from.
    #[error("input has neither a year column nor a class label to derive one from")]
    NoTemporalSource,

    /// A collection lacks a defined coordinate reference system.
    #[error("{collection} collection has no defined CRS")]
    UndefinedCrs { collection: &'static str },

    /// An EPSG code with no entry in the projection definition table.
    /// Silently assuming a reference system is disallowed.
    #[error("EPSG:{0} is not in the supported CRS table")]
    UnsupportedCrs(u32),

    /// Attribute-table fault (bad cast, missing column after resolution).
    #[error(transparent)]
    Table(#[from] polars::error::PolarsError),
}
