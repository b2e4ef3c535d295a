//! Failure taxonomy for resolving and installing a release.
//!
//! Every variant is terminal for the current invocation. The variants travel
//! inside `anyhow::Error` and are recovered with `downcast_ref` where the
//! caller needs to tell them apart (exit codes, tests).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    /// No release target exists for the detected host.
    #[error("Unsupported platform: no release for {os}/{arch} ({bits}-bit)")]
    UnsupportedPlatform {
        os: String,
        arch: String,
        bits: u32,
    },

    /// Transport failure while fetching the archive.
    #[error("Network error while downloading {url}: {reason}")]
    Network { url: String, reason: String },

    /// Downloaded bytes do not hash to the declared checksum.
    #[error("Integrity check failed for {url}: expected sha256 {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    /// The archive is unreadable or does not contain the binary.
    #[error("Corrupt archive {archive}: {reason}")]
    CorruptArchive { archive: String, reason: String },
}

impl InstallError {
    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::UnsupportedPlatform { .. } => 2,
            InstallError::Network { .. } => 3,
            InstallError::Integrity { .. } => 4,
            InstallError::CorruptArchive { .. } => 5,
        }
    }
}

/// First [`InstallError`] anywhere in an error chain.
pub fn find_install_error(err: &anyhow::Error) -> Option<&InstallError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<InstallError>())
}

/// Exit code for any error chain: the taxonomy's code when one is present, 1 otherwise.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    find_install_error(err)
        .map(InstallError::exit_code)
        .unwrap_or(1)
}
