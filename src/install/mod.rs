//! The fetch-verify-install pipeline.
//!
//! [`Installer`] drives one release target through
//! resolving → downloading → verifying → extracting → installing, placing
//! the binary atomically in the bin directory.

use anyhow::Result;
use std::path::PathBuf;

use crate::{
    archive::Extractor, download::Downloader, formula::Formula, platform::PlatformDetector,
    runtime::Runtime,
};

pub mod config;
mod installer;
mod paths;

pub use installer::{Installer, Stage};
pub use paths::{default_bin_dir, get_bin_dir};

use config::Config;

/// Install the formula's binary for the running host.
#[tracing::instrument(skip(runtime, formula, bin_dir))]
pub async fn install<R: Runtime>(
    runtime: R,
    formula: &Formula,
    bin_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    let config = Config::new(runtime, bin_dir)?;
    run(formula, config).await
}

#[tracing::instrument(skip(formula, config))]
pub async fn run<R: Runtime, D: Downloader, E: Extractor, P: PlatformDetector>(
    formula: &Formula,
    config: Config<R, D, E, P>,
) -> Result<PathBuf> {
    let installer = Installer::new(
        config.runtime,
        config.downloader,
        config.extractor,
        config.detector,
    );
    installer.install(formula, config.bin_dir).await
}
