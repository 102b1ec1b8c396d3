//! IO module for format-specific reading and writing operations.
//!
//! The pipeline itself is format-agnostic: it takes [`crate::GeoTable`]s and
//! returns a DataFrame. These adapters are the external collaborators that
//! feed and drain it.
//!
//! - `shapefile` - PRODES exports and the IBGE municipal mesh (.shp + .dbf)
//! - `csv` - the aggregated output table

mod csv;
mod shapefile;

pub use csv::{write_csv, write_csv_string};
pub use shapefile::read_shapefile;
