//! Canonical attribute names and the alias tables that map historical
//! column-naming conventions onto them.
//!
//! PRODES exports and IBGE municipal meshes have drifted across vintages:
//! the state column has been `state`, `SIGLA_UF` or `UF`; the municipality
//! name has been `NM_MUN`, `NOME`, `NM_MUNICIP` or `NOM_MUN`, with geocode
//! columns as a fallback. Resolution is a pure first-match scan over an
//! ordered alias list — exact, case-sensitive, no fuzzy matching.

use polars::frame::DataFrame;

use crate::error::PipelineError;

/// Canonical attributes the pipeline resolves against input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Short administrative code of the parent region (e.g. `"PA"`).
    RegionCode,
    /// Direct integer year of the detected change event.
    Year,
    /// Free-text classification label carrying an encoded year (`d####`).
    Label,
    /// Municipality name, falling back to a geocode column.
    BoundaryId,
}

impl Attribute {
    /// Canonical name, used in error reporting.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::RegionCode => "region_code",
            Attribute::Year => "year",
            Attribute::Label => "label",
            Attribute::BoundaryId => "boundary_id",
        }
    }

    /// Known aliases, in priority order. Earlier entries win.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Attribute::RegionCode => &["state", "SIGLA_UF", "sigla_uf", "UF", "ESTADO"],
            Attribute::Year => &["year", "ano", "YEAR"],
            Attribute::Label => &["class_name", "CLASS_NAME", "mainclass", "classe"],
            // Name columns first; geocode columns only as a fallback.
            Attribute::BoundaryId => &[
                "NM_MUN", "NOME", "NM_MUNICIP", "NOM_MUN", "CD_MUN", "COD_MUN", "GEOCODIGO",
            ],
        }
    }
}

/// Resolve `attribute` against the column names of `df`.
///
/// Returns the first alias present in the table, or `None`. Deterministic:
/// the same column set always resolves to the same alias.
pub fn resolve(df: &DataFrame, attribute: Attribute) -> Option<&'static str> {
    let names = df.get_column_names();
    attribute
        .aliases()
        .iter()
        .find(|alias| names.iter().any(|name| name.as_str() == **alias))
        .copied()
}

/// Like [`resolve`], but a missing column is an error naming the canonical
/// attribute.
pub fn require(df: &DataFrame, attribute: Attribute) -> Result<&'static str, PipelineError> {
    resolve(df, attribute).ok_or(PipelineError::ColumnNotFound { attribute: attribute.name() })
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    fn frame(columns: &[&str]) -> DataFrame {
        DataFrame::new(
            columns
                .iter()
                .map(|name| Series::new((*name).into(), Vec::<String>::new()).into())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn first_listed_alias_wins() {
        // Both a name column and a geocode column present: the name wins.
        let df = frame(&["CD_MUN", "NOME", "geometry"]);
        assert_eq!(resolve(&df, Attribute::BoundaryId), Some("NOME"));

        // Priority follows the alias list, not the column order.
        let df = frame(&["NOME", "NM_MUN"]);
        assert_eq!(resolve(&df, Attribute::BoundaryId), Some("NM_MUN"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let df = frame(&["SIGLA_UF", "state"]);
        for _ in 0..10 {
            assert_eq!(resolve(&df, Attribute::RegionCode), Some("state"));
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        let df = frame(&["State", "Year"]);
        assert_eq!(resolve(&df, Attribute::RegionCode), None);
        assert_eq!(resolve(&df, Attribute::Year), None);
    }

    #[test]
    fn missing_column_names_the_canonical_attribute() {
        let df = frame(&["unrelated"]);
        let err = require(&df, Attribute::BoundaryId).unwrap_err();
        assert!(err.to_string().contains("boundary_id"));
    }

    #[test]
    fn geocode_fallback_applies_when_no_name_column() {
        let df = frame(&["GEOCODIGO", "SIGLA_UF"]);
        assert_eq!(resolve(&df, Attribute::BoundaryId), Some("GEOCODIGO"));
    }
}
