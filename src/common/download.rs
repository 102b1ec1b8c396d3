use std::path::Path;

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;

/// Download a large file from `url` to `out_path`.
///
/// The body streams into a temp file next to the target and lands with an
/// atomic rename, so an interrupted download never leaves a truncated file
/// at `out_path`. Refuses to overwrite unless `force`.
pub(crate) fn download_big_file(url: &str, out_path: &Path, force: bool) -> Result<()> {
    if !force && out_path.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", out_path.display());
    }
    let parent = out_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create dir {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent).context("create temp file")?;

    let mut resp = reqwest::blocking::get(url)
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned error status"))?;
    std::io::copy(&mut resp, &mut tmp)
        .with_context(|| format!("write {}", out_path.display()))?;

    tmp.as_file().sync_all().ok(); // best-effort fsync
    tmp.persist(out_path)
        .with_context(|| format!("rename to {}", out_path.display()))?;
    Ok(())
}
