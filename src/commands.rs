use anyhow::{Context, Result, bail};

use crate::cli::{Cli, ProcessArgs};
use crate::io;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Run the aggregation pipeline over shapefile inputs and write the CSV.
pub fn process(cli: &Cli, args: &ProcessArgs) -> Result<()> {
    if !args.force && args.output.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", args.output.display());
    }

    if cli.verbose > 0 {
        eprintln!("[process] prodes={} region={}", args.prodes.display(), args.region);
    }
    let features = io::read_shapefile(&args.prodes, Some(args.epsg))?;
    if cli.verbose > 0 {
        eprintln!("[process] loaded {} features", features.len());
    }

    let boundaries = match &args.municipalities {
        Some(path) => {
            if cli.verbose > 0 {
                eprintln!("[process] municipalities={}", path.display());
            }
            Some(io::read_shapefile(path, Some(args.municipalities_epsg))?)
        }
        None => None,
    };

    let pipeline = Pipeline::new(PipelineConfig::new(&args.region));
    let output = pipeline
        .run(&features, boundaries.as_ref())
        .context("pipeline run failed")?;

    if cli.verbose > 0 {
        eprintln!(
            "[process] matched={} dated={} skipped={} mode={:?}",
            output.report.region_matches,
            output.report.dated_features,
            output.report.skipped_invalid,
            output.report.mode,
        );
        if let Some(cause) = &output.report.join_failure {
            eprintln!("[process] spatial join failed, degraded to year-only: {cause}");
        }
    }

    let mut table = output.table;
    io::write_csv(&mut table, &args.output)?;
    println!("Wrote {} rows to {}", output.report.output_rows, args.output.display());

    if args.report {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    }
    Ok(())
}

/// Fetch and extract the IBGE municipal mesh (BR_Municipios_2022).
#[cfg(feature = "download")]
pub fn download(cli: &Cli, args: &crate::cli::DownloadArgs) -> Result<()> {
    use crate::common::{download_big_file, ensure_dir_exists, extract_zip};

    const MESH_URL: &str = "https://geoftp.ibge.gov.br/organizacao_do_territorio/\
malhas_territoriais/malhas_municipais/municipio_2022/Brasil/BR/BR_Municipios_2022.zip";

    ensure_dir_exists(&args.out)?;
    let zip_path = args.out.join("BR_Municipios_2022.zip");

    if cli.verbose > 0 {
        eprintln!("[download] {MESH_URL} -> {}", zip_path.display());
    }
    download_big_file(MESH_URL, &zip_path, args.force)?;

    if cli.verbose > 0 {
        eprintln!("[extract] {} -> {}", zip_path.display(), args.out.display());
    }
    extract_zip(&zip_path, &args.out, true)?;

    println!("Municipal mesh extracted into {}", args.out.display());
    Ok(())
}
