use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Get the directory the binary is installed into
#[tracing::instrument(skip(runtime, bin_dir))]
pub fn get_bin_dir<R: Runtime + ?Sized>(runtime: &R, bin_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match bin_dir {
        Some(path) => path,
        None => default_bin_dir(runtime)?,
    };

    info!("Using bin directory: {}", dir.display());
    Ok(dir)
}

/// Install location for privileged runs. Only macOS and Linux releases
/// exist, so every host that gets this far is unix.
const SYSTEM_BIN_DIR: &str = "/usr/local/bin";

/// Get the default bin directory
#[tracing::instrument(skip(runtime))]
pub fn default_bin_dir<R: Runtime + ?Sized>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        Ok(PathBuf::from(SYSTEM_BIN_DIR))
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        Ok(home_dir.join(".local").join("bin"))
    }
}

/// Per-invocation scratch directory under the system temp dir.
pub(crate) fn work_dir<R: Runtime + ?Sized>(runtime: &R, seq: u64) -> PathBuf {
    runtime
        .temp_dir()
        .join(format!("stratus-install-{}-{}", std::process::id(), seq))
}

/// Hidden sibling of the installed binary, renamed over it once complete.
pub(crate) fn partial_path(bin_dir: &std::path::Path, binary: &str) -> PathBuf {
    bin_dir.join(format!(".{}.partial", binary))
}
