use anyhow::Result;
use std::fmt::Write;
use std::path::PathBuf;

use crate::{formula::Formula, runtime::Runtime};

use super::load_formula;

/// Show formula metadata and the full target table
#[tracing::instrument(skip(runtime, formula_path))]
pub fn info<R: Runtime>(runtime: &R, formula_path: Option<PathBuf>) -> Result<()> {
    let formula = load_formula(runtime, formula_path.as_deref())?;
    print!("{}", summary(&formula)?);
    Ok(())
}

fn summary(formula: &Formula) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Name: {}", formula.name)?;
    if !formula.desc.is_empty() {
        writeln!(out, "Description: {}", formula.desc)?;
    }
    writeln!(out, "Version: {}", formula.version)?;
    writeln!(out, "Homepage: {}", formula.homepage)?;
    writeln!(out, "License: {}", formula.license)?;
    writeln!(out, "Binary: {}", formula.binary)?;

    writeln!(out, "\nTargets:")?;
    for target in &formula.targets {
        writeln!(out, "  {:<14} {}", target.platform().to_string(), target.url)?;
        writeln!(out, "  {:<14} sha256 {}", "", target.sha256)?;
    }
    Ok(out)
}
