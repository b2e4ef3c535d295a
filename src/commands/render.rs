use anyhow::Result;
use std::path::PathBuf;

use crate::{formula::Homebrew, runtime::Runtime};

use super::load_formula;

/// Print the formula as a package-manager recipe
#[tracing::instrument(skip(runtime, formula_path))]
pub fn render<R: Runtime>(runtime: &R, formula_path: Option<PathBuf>) -> Result<()> {
    let formula = load_formula(runtime, formula_path.as_deref())?;
    print!("{}", Homebrew(&formula));
    Ok(())
}
