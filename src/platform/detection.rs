use crate::error::InstallError;

use super::{Arch, Os, Platform};

/// Raw description of the host as reported by the toolchain.
///
/// Kept as plain strings so that hosts with no release (Windows, 32-bit
/// Linux, ...) can still be described and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
    pub pointer_width: u32,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, pointer_width: u32) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            pointer_width,
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            pointer_width: Self::detect_pointer_width(),
        }
    }

    fn detect_pointer_width() -> u32 {
        #[cfg(target_pointer_width = "64")]
        {
            64
        }
        #[cfg(target_pointer_width = "32")]
        {
            32
        }
        #[cfg(not(any(target_pointer_width = "64", target_pointer_width = "32")))]
        {
            16
        }
    }

    /// Map the host onto a release table key.
    ///
    /// Linux additionally requires a 64-bit host: both published Linux
    /// builds are 64-bit only.
    pub fn platform(&self) -> Result<Platform, InstallError> {
        let os = match self.os.as_str() {
            "macos" => Some(Os::MacOs),
            "linux" => Some(Os::Linux),
            _ => None,
        };
        let arch = match self.arch.as_str() {
            "x86_64" | "amd64" => Some(Arch::X86_64),
            "aarch64" | "arm64" => Some(Arch::Arm64),
            _ => None,
        };

        match (os, arch) {
            (Some(Os::Linux), Some(_)) if self.pointer_width != 64 => Err(self.unsupported()),
            (Some(os), Some(arch)) => Ok(Platform::new(os, arch)),
            _ => Err(self.unsupported()),
        }
    }

    pub(crate) fn unsupported(&self) -> InstallError {
        InstallError::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
            bits: self.pointer_width,
        }
    }
}

/// Trait for platform detection (useful for testing)
#[cfg_attr(test, mockall::automock)]
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> HostPlatform;
}

/// Default platform detector using compile-time detection
pub struct DefaultPlatformDetector;

impl PlatformDetector for DefaultPlatformDetector {
    fn detect(&self) -> HostPlatform {
        HostPlatform::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let host = HostPlatform::detect();

        assert!(!host.os.is_empty());
        assert!(!host.arch.is_empty());

        #[cfg(target_os = "macos")]
        assert_eq!(host.os, "macos");

        #[cfg(target_os = "linux")]
        assert_eq!(host.os, "linux");

        #[cfg(target_arch = "x86_64")]
        assert_eq!(host.arch, "x86_64");

        #[cfg(target_arch = "aarch64")]
        assert_eq!(host.arch, "aarch64");

        #[cfg(target_pointer_width = "64")]
        assert_eq!(host.pointer_width, 64);
    }

    #[test]
    fn test_default_platform_detector() {
        let detector = DefaultPlatformDetector;
        assert_eq!(detector.detect(), HostPlatform::detect());
    }

    #[test]
    fn test_supported_hosts_map_to_keys() {
        let cases = [
            ("macos", "x86_64", Os::MacOs, Arch::X86_64),
            ("macos", "aarch64", Os::MacOs, Arch::Arm64),
            ("linux", "aarch64", Os::Linux, Arch::Arm64),
            ("linux", "x86_64", Os::Linux, Arch::X86_64),
            ("linux", "amd64", Os::Linux, Arch::X86_64),
        ];
        for (os, arch, want_os, want_arch) in cases {
            let platform = HostPlatform::new(os, arch, 64).platform().unwrap();
            assert_eq!(platform, Platform::new(want_os, want_arch), "{os}/{arch}");
        }
    }

    #[test]
    fn test_linux_requires_64_bit() {
        let err = HostPlatform::new("linux", "aarch64", 32)
            .platform()
            .unwrap_err();
        assert_eq!(
            err,
            InstallError::UnsupportedPlatform {
                os: "linux".into(),
                arch: "aarch64".into(),
                bits: 32,
            }
        );
    }

    #[test]
    fn test_unknown_hosts_are_unsupported() {
        for (os, arch, bits) in [
            ("linux", "x86", 32),
            ("windows", "x86_64", 64),
            ("freebsd", "x86_64", 64),
            ("linux", "riscv64", 64),
            ("macos", "powerpc", 32),
        ] {
            assert!(
                matches!(
                    HostPlatform::new(os, arch, bits).platform(),
                    Err(InstallError::UnsupportedPlatform { .. })
                ),
                "{os}/{arch}/{bits}"
            );
        }
    }
}
