use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// PRODES deforestation aggregation CLI
#[derive(Parser, Debug)]
#[command(name = "desmata", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate PRODES polygons into a per-municipality, per-year CSV
    Process(ProcessArgs),

    /// Download the IBGE municipal mesh used for boundary attribution
    #[cfg(feature = "download")]
    Download(DownloadArgs),
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// PRODES deforestation shapefile (.shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub prodes: PathBuf,

    /// Target state code, e.g. PA
    #[arg(short, long)]
    pub region: String,

    /// Municipality boundary shapefile (.shp); omit to aggregate by year only
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub municipalities: Option<PathBuf>,

    /// EPSG code of the PRODES layer (shapefiles don't carry one in-band)
    #[arg(long, default_value_t = 4674)]
    pub epsg: u32,

    /// EPSG code of the municipality layer
    #[arg(long, default_value_t = 4674)]
    pub municipalities_epsg: u32,

    /// Output CSV path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,

    /// Print the run report as JSON to stdout
    #[arg(long)]
    pub report: bool,
}

#[cfg(feature = "download")]
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Output location (directory)
    #[arg(value_hint = ValueHint::DirPath)]
    pub out: PathBuf,

    /// Overwrite a previously downloaded archive
    #[arg(long)]
    pub force: bool,
}
