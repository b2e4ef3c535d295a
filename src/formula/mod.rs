//! Release formula: the per-version table of downloadable targets
//!
//! A [`Formula`] describes one released version: its metadata, the name of
//! the single binary shipped in every archive, and one [`ReleaseTarget`] per
//! supported `(os, arch)` pair. A formula is never edited in place; a new
//! version is a new formula, built in, loaded from JSON, or generated from a
//! release checksums listing.

mod digest;
mod generate;
mod render;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::platform::{Arch, Os, Platform};
use crate::runtime::Runtime;

pub use digest::Checksum;
pub use render::Homebrew;

/// Project name used in release file names.
pub const PROJECT_NAME: &str = "stratus-red-team";

/// Name of the executable shipped in every release archive.
pub const BINARY_NAME: &str = "stratus";

/// Where release archives are published, one sub-directory per `v<version>` tag.
pub const DEFAULT_DOWNLOAD_BASE: &str =
    "https://github.com/DataDog/stratus-red-team/releases/download";

const BUILTIN_VERSION: &str = "1.3.0";
const HOMEPAGE: &str = "https://stratus-red-team.cloud";
const LICENSE: &str = "Apache-2.0";

/// Published 1.3.0 archives, in formula order.
const BUILTIN_TARGETS: [(Os, Arch, &str); 4] = [
    (
        Os::MacOs,
        Arch::X86_64,
        "5cc4a5f0d417cf02ee18781d40c9ed4556aa4bdc985ec0638a5f5fdbc9a3d27b",
    ),
    (
        Os::MacOs,
        Arch::Arm64,
        "9c6ecc47cd096acdd0286178c7f0a2aeddf028b899d6b1380a6825e0d2e18aee",
    ),
    (
        Os::Linux,
        Arch::Arm64,
        "3763850453ba364ce985530f88e629ae11f335e5504a1d4aceec2038852739a1",
    ),
    (
        Os::Linux,
        Arch::X86_64,
        "c40414480e1ac3ad0e7192bf1626173b5c2531d76beb473f1dfbf7b5dceb22bf",
    ),
];

/// Reasons a formula is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("invalid sha256 checksum '{0}': expected 64 hex characters")]
    InvalidChecksum(String),
    #[error("formula version must not be empty")]
    EmptyVersion,
    #[error("invalid binary name '{0}'")]
    InvalidBinaryName(String),
    #[error("formula has no release targets")]
    NoTargets,
    #[error("duplicate release target for {0}")]
    DuplicateTarget(Platform),
    #[error("release target for {0} has an empty url")]
    EmptyUrl(Platform),
}

/// One row of the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTarget {
    pub os: Os,
    pub arch: Arch,
    pub url: String,
    pub sha256: Checksum,
}

impl ReleaseTarget {
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    /// File name of the archive, taken from the last url segment.
    pub fn archive_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.rsplit('/').next().unwrap_or(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub homepage: String,
    pub version: String,
    pub license: String,
    #[serde(default = "default_binary")]
    pub binary: String,
    pub targets: Vec<ReleaseTarget>,
}

fn default_binary() -> String {
    BINARY_NAME.to_string()
}

/// Archive URL for one platform of a published version.
pub fn release_url(download_base: &str, version: &str, platform: Platform) -> String {
    format!(
        "{}/v{}/{}",
        download_base.trim_end_matches('/'),
        version,
        archive_file_name(version, platform)
    )
}

/// `stratus-red-team_<version>_<Os>_<arch>.tar.gz`
pub fn archive_file_name(version: &str, platform: Platform) -> String {
    format!(
        "{}_{}_{}_{}.tar.gz",
        PROJECT_NAME,
        version,
        platform.os.release_name(),
        platform.arch.release_name()
    )
}

impl Formula {
    /// The compiled-in 1.3.0 release table.
    pub fn builtin() -> Self {
        let targets = BUILTIN_TARGETS
            .iter()
            .map(|(os, arch, sha256)| {
                let platform = Platform::new(*os, *arch);
                ReleaseTarget {
                    os: *os,
                    arch: *arch,
                    url: release_url(DEFAULT_DOWNLOAD_BASE, BUILTIN_VERSION, platform),
                    sha256: Checksum::from_static(sha256),
                }
            })
            .collect();

        Self::with_targets(BUILTIN_VERSION, targets)
    }

    /// Project metadata with the given version and targets.
    pub(crate) fn with_targets(version: &str, targets: Vec<ReleaseTarget>) -> Self {
        Self {
            name: PROJECT_NAME.to_string(),
            desc: String::new(),
            homepage: HOMEPAGE.to_string(),
            version: version.to_string(),
            license: LICENSE.to_string(),
            binary: BINARY_NAME.to_string(),
            targets,
        }
    }

    /// Load and validate a JSON formula file.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading formula from {:?}", path);
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read formula file {:?}", path))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid formula file {:?}", path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let formula: Formula =
            serde_json::from_str(content).context("Failed to parse formula JSON")?;
        formula.validate()?;
        Ok(formula)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize formula")
    }

    /// The entry for `platform`, if the release covers it.
    pub fn target(&self, platform: Platform) -> Option<&ReleaseTarget> {
        self.targets.iter().find(|t| t.platform() == platform)
    }

    pub fn validate(&self) -> Result<(), FormulaError> {
        if self.version.trim().is_empty() {
            return Err(FormulaError::EmptyVersion);
        }
        if self.binary.is_empty()
            || self.binary.contains(['/', '\\'])
            || self.binary == "."
            || self.binary == ".."
        {
            return Err(FormulaError::InvalidBinaryName(self.binary.clone()));
        }
        if self.targets.is_empty() {
            return Err(FormulaError::NoTargets);
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            let platform = target.platform();
            if !seen.insert(platform) {
                return Err(FormulaError::DuplicateTarget(platform));
            }
            if target.url.trim().is_empty() {
                return Err(FormulaError::EmptyUrl(platform));
            }
        }
        Ok(())
    }
}
