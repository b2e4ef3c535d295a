//! Platform keys, host detection and release target resolution
//!
//! This module provides the typed `(Os, Arch)` key that indexes a formula's
//! target table, detection of the running host, and the resolver that maps
//! a detected host to exactly one release target.

mod detection;
mod resolver;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use detection::{DefaultPlatformDetector, HostPlatform, PlatformDetector};
#[cfg(test)]
pub use detection::MockPlatformDetector;
pub use resolver::resolve;

/// Operating system families that releases are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    #[serde(rename = "macos")]
    MacOs,
    Linux,
}

impl Os {
    /// Name used in release file names (`Darwin`, `Linux`).
    pub fn release_name(&self) -> &'static str {
        match self {
            Os::MacOs => "Darwin",
            Os::Linux => "Linux",
        }
    }

    pub fn from_release_name(name: &str) -> Option<Self> {
        match name {
            "Darwin" => Some(Os::MacOs),
            "Linux" => Some(Os::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::MacOs => write!(f, "macos"),
            Os::Linux => write!(f, "linux"),
        }
    }
}

impl FromStr for Os {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Ok(Os::MacOs),
            "linux" => Ok(Os::Linux),
            other => Err(anyhow!("Unknown OS '{}'", other)),
        }
    }
}

/// CPU architectures that releases are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl Arch {
    /// Name used in release file names (`x86_64`, `arm64`).
    pub fn release_name(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }

    pub fn from_release_name(name: &str) -> Option<Self> {
        match name {
            "x86_64" => Some(Arch::X86_64),
            "arm64" => Some(Arch::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.release_name())
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" | "intel" => Ok(Arch::X86_64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            other => Err(anyhow!("Unknown architecture '{}'", other)),
        }
    }
}

/// Composite key of the release table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_parse_aliases() {
        assert_eq!("macos".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("Darwin".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("LINUX".parse::<Os>().unwrap(), Os::Linux);
        assert!("windows".parse::<Os>().is_err());
    }

    #[test]
    fn test_arch_parse_aliases() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert!("i686".parse::<Arch>().is_err());
        // 32-bit ARM has no release
        assert!("arm".parse::<Arch>().is_err());
        assert!("armv7l".parse::<Arch>().is_err());
    }

    #[test]
    fn test_release_names_round_trip() {
        for os in [Os::MacOs, Os::Linux] {
            assert_eq!(Os::from_release_name(os.release_name()), Some(os));
        }
        for arch in [Arch::X86_64, Arch::Arm64] {
            assert_eq!(Arch::from_release_name(arch.release_name()), Some(arch));
        }
        assert_eq!(Os::from_release_name("Windows"), None);
        assert_eq!(Arch::from_release_name("i386"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Os::MacOs).unwrap(), "\"macos\"");
        assert_eq!(serde_json::to_string(&Os::Linux).unwrap(), "\"linux\"");
        assert_eq!(serde_json::to_string(&Arch::X86_64).unwrap(), "\"x86_64\"");
        assert_eq!(serde_json::to_string(&Arch::Arm64).unwrap(), "\"arm64\"");
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(
            Platform::new(Os::MacOs, Arch::Arm64).to_string(),
            "macos/arm64"
        );
    }
}
