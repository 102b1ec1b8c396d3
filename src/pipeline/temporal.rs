//! Year derivation.
//!
//! PRODES vintages either carry an integer `year` column directly or encode
//! the year inside the classification label (`d2019` and friends). Features
//! that cannot produce a year at or above the floor are dropped, never
//! defaulted.

use polars::frame::DataFrame;
use polars::prelude::DataType;
use regex::Regex;

use crate::error::PipelineError;
use crate::schema::{self, Attribute};

/// Derive a year for every row of `df`.
///
/// Prefers a direct year column (non-strict integer cast: non-numeric values
/// become `None`), falling back to capture group 1 of `pattern` applied to
/// the label column. `None` entries mark rows the caller must drop. Rows
/// below `floor` are dropped the same way on both paths.
pub(crate) fn derive_years(
    df: &DataFrame,
    pattern: &Regex,
    floor: i32,
) -> Result<Vec<Option<i32>>, PipelineError> {
    if let Some(column) = schema::resolve(df, Attribute::Year) {
        let years = df.column(column)?.cast(&DataType::Int32)?;
        Ok(years
            .i32()?
            .into_iter()
            .map(|year| year.filter(|y| *y >= floor))
            .collect())
    } else if let Some(column) = schema::resolve(df, Attribute::Label) {
        let labels = df.column(column)?.cast(&DataType::String)?;
        Ok(labels
            .str()?
            .into_iter()
            .map(|label| {
                label
                    .and_then(|l| pattern.captures(l))
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<i32>().ok())
                    .filter(|y| *y >= floor)
            })
            .collect())
    } else {
        Err(PipelineError::NoTemporalSource)
    }
}
