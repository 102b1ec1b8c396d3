//! Region filtering.

use polars::frame::DataFrame;
use polars::prelude::DataType;

use crate::error::PipelineError;
use crate::schema::{self, Attribute};

/// Row indices of `df` whose `column` equals `target`, in original order.
pub(crate) fn region_mask(
    df: &DataFrame,
    column: &str,
    target: &str,
) -> Result<Vec<usize>, PipelineError> {
    let codes = df.column(column)?.cast(&DataType::String)?;
    Ok(codes
        .str()?
        .into_iter()
        .enumerate()
        .filter_map(|(idx, code)| (code == Some(target)).then_some(idx))
        .collect())
}

/// Select the features belonging to the target region.
///
/// Returns the row indices of matching features, preserving relative order.
/// Signals [`PipelineError::MissingRegionColumn`] when no region-code column
/// resolves, and [`PipelineError::NoMatchingRegion`] when the result is
/// empty — the caller decides whether that is fatal.
pub fn filter_by_region(df: &DataFrame, target: &str) -> Result<Vec<usize>, PipelineError> {
    let column =
        schema::resolve(df, Attribute::RegionCode).ok_or(PipelineError::MissingRegionColumn)?;
    let kept = region_mask(df, column, target)?;
    if kept.is_empty() {
        return Err(PipelineError::NoMatchingRegion { region: target.to_string() });
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    fn states(values: &[&str]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("state".into(), values.iter().map(|s| s.to_string()).collect::<Vec<_>>())
                .into(),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let df = states(&["PA", "SP", "PA", "AM", "PA"]);
        assert_eq!(filter_by_region(&df, "PA").unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let df = states(&["PA", "SP", "PA"]);
        let kept = filter_by_region(&df, "PA").unwrap();

        // Re-filter the already-filtered collection: everything survives.
        let filtered = states(&kept.iter().map(|_| "PA").collect::<Vec<_>>());
        let again = filter_by_region(&filtered, "PA").unwrap();
        assert_eq!(again, (0..kept.len()).collect::<Vec<_>>());
    }

    #[test]
    fn missing_region_column_is_fatal() {
        let df = DataFrame::new(vec![
            Series::new("uf_sigla".into(), vec!["PA".to_string()]).into(),
        ])
        .unwrap();
        assert!(matches!(
            filter_by_region(&df, "PA"),
            Err(PipelineError::MissingRegionColumn)
        ));
    }

    #[test]
    fn empty_result_signals_no_matching_region() {
        let df = states(&["SP", "MG"]);
        match filter_by_region(&df, "PA") {
            Err(PipelineError::NoMatchingRegion { region }) => assert_eq!(region, "PA"),
            other => panic!("expected NoMatchingRegion, got {other:?}"),
        }
    }
}
