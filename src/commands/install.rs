use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::load_formula;

/// Install the binary for the running host
#[tracing::instrument(skip(runtime, formula_path, bin_dir))]
pub async fn install<R: Runtime>(
    runtime: R,
    formula_path: Option<PathBuf>,
    bin_dir: Option<PathBuf>,
) -> Result<()> {
    let formula = load_formula(&runtime, formula_path.as_deref())?;
    let path_var = runtime.env_var("PATH").unwrap_or_default();

    let installed = crate::install::install(runtime, &formula, bin_dir).await?;

    if let Some(dir) = installed.parent() {
        if !is_on_path(&path_var, dir) {
            println!(
                "   note: {} is not on PATH; add it to run `{}` directly",
                dir.display(),
                formula.binary
            );
        }
    }
    Ok(())
}

fn is_on_path(path_var: &str, dir: &Path) -> bool {
    let found = std::env::split_paths(path_var).any(|entry| entry == dir);
    debug!("{:?} on PATH: {}", dir, found);
    found
}
