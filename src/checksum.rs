//! SHA-256 verification of downloaded archives.

use anyhow::{Context, Result};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::InstallError;
use crate::formula::ReleaseTarget;
use crate::runtime::Runtime;

/// Hex SHA-256 of a file, streamed through the runtime.
#[tracing::instrument(skip(runtime))]
pub fn sha256_file<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<String> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for hashing", path))?;
    let mut hasher = Sha256::new();
    let bytes = std::io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("Failed to read {:?} for hashing", path))?;
    let digest = format!("{:x}", hasher.finalize());
    debug!("sha256 of {:?} ({} bytes): {}", path, bytes, digest);
    Ok(digest)
}

/// Check a downloaded archive against the target's declared checksum.
///
/// Returns the computed digest; a mismatch is an [`InstallError::Integrity`].
#[tracing::instrument(skip(runtime, target))]
pub fn verify_archive<R: Runtime + ?Sized>(
    runtime: &R,
    archive: &Path,
    target: &ReleaseTarget,
) -> Result<String> {
    let actual = sha256_file(runtime, archive)?;
    if !target.sha256.matches(&actual) {
        return Err(InstallError::Integrity {
            url: target.url.clone(),
            expected: target.sha256.to_string(),
            actual,
        }
        .into());
    }
    info!("Checksum verified: {}", actual);
    Ok(actual)
}
