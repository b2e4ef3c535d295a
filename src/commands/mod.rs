use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{formula::Formula, runtime::Runtime};

mod generate;
mod info;
mod install;
mod render;
mod resolve;

pub use generate::generate;
pub use info::info;
pub use install::install;
pub use render::render;
pub use resolve::{HostOverrides, resolve};

/// The formula selected on the command line, or the built-in release table.
#[tracing::instrument(skip(runtime))]
pub fn load_formula<R: Runtime>(runtime: &R, formula_path: Option<&Path>) -> Result<Formula> {
    match formula_path {
        Some(path) => Formula::load(runtime, path),
        None => {
            debug!("Using built-in formula");
            Ok(Formula::builtin())
        }
    }
}
