use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::platform::{Arch, Os, Platform};

use super::{Checksum, Formula, PROJECT_NAME, ReleaseTarget, release_url};

impl Formula {
    /// Build a formula from a release `checksums.txt` listing.
    ///
    /// Each line is `<sha256>  <file>`. Only archives named
    /// `stratus-red-team_<version>_<Darwin|Linux>_<x86_64|arm64>.tar.gz` become
    /// targets; everything else in the listing (other platforms, zips,
    /// packages) is ignored. Targets keep the order of the listing.
    #[tracing::instrument(skip(checksums))]
    pub fn from_checksums(version: &str, download_base: &str, checksums: &str) -> Result<Self> {
        let version = version.trim_start_matches('v');
        let mut targets = Vec::new();

        for (index, line) in checksums.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(hash), Some(file)) = (fields.next(), fields.next()) else {
                return Err(anyhow!("Malformed checksums line {}: '{}'", index + 1, line));
            };
            // sha256sum marks binary-mode entries with a leading '*'
            let file = file.trim_start_matches('*');

            let Some(platform) = parse_archive_name(version, file) else {
                debug!("Skipping {} (not a release archive for {})", file, version);
                continue;
            };

            let sha256: Checksum = hash
                .parse()
                .with_context(|| format!("Bad checksum for {} on line {}", file, index + 1))?;

            targets.push(ReleaseTarget {
                os: platform.os,
                arch: platform.arch,
                url: release_url(download_base, version, platform),
                sha256,
            });
        }

        let formula = Formula::with_targets(version, targets);
        formula.validate()?;
        Ok(formula)
    }
}

fn parse_archive_name(version: &str, file: &str) -> Option<Platform> {
    let rest = file
        .strip_prefix(PROJECT_NAME)?
        .strip_prefix('_')?
        .strip_prefix(version)?
        .strip_prefix('_')?
        .strip_suffix(".tar.gz")?;
    let (os, arch) = rest.split_once('_')?;
    Some(Platform::new(
        Os::from_release_name(os)?,
        Arch::from_release_name(arch)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{DEFAULT_DOWNLOAD_BASE, FormulaError};

    const CHECKSUMS_1_3_0: &str = "\
5cc4a5f0d417cf02ee18781d40c9ed4556aa4bdc985ec0638a5f5fdbc9a3d27b  stratus-red-team_1.3.0_Darwin_x86_64.tar.gz
9c6ecc47cd096acdd0286178c7f0a2aeddf028b899d6b1380a6825e0d2e18aee  stratus-red-team_1.3.0_Darwin_arm64.tar.gz
3763850453ba364ce985530f88e629ae11f335e5504a1d4aceec2038852739a1  stratus-red-team_1.3.0_Linux_arm64.tar.gz
c40414480e1ac3ad0e7192bf1626173b5c2531d76beb473f1dfbf7b5dceb22bf  stratus-red-team_1.3.0_Linux_x86_64.tar.gz
";

    #[test]
    fn test_from_checksums_reproduces_builtin() {
        let formula =
            Formula::from_checksums("1.3.0", DEFAULT_DOWNLOAD_BASE, CHECKSUMS_1_3_0).unwrap();
        assert_eq!(formula, Formula::builtin());
    }

    #[test]
    fn test_from_checksums_accepts_v_prefix() {
        let formula =
            Formula::from_checksums("v1.3.0", DEFAULT_DOWNLOAD_BASE, CHECKSUMS_1_3_0).unwrap();
        assert_eq!(formula.version, "1.3.0");
    }

    #[test]
    fn test_from_checksums_skips_unsupported_files() {
        let listing = [
            format!("{}  stratus-red-team_2.0.0_Windows_x86_64.zip", "0".repeat(64)),
            format!("{}  stratus-red-team_2.0.0_Linux_i386.tar.gz", "1".repeat(64)),
            format!("{}  stratus-red-team_1.9.0_Linux_x86_64.tar.gz", "2".repeat(64)),
            format!("{} *stratus-red-team_2.0.0_Linux_x86_64.tar.gz", "3".repeat(64)),
        ]
        .join("\n");

        let formula =
            Formula::from_checksums("2.0.0", "https://mirror.example.com/dl/", &listing).unwrap();

        assert_eq!(formula.targets.len(), 1);
        let target = &formula.targets[0];
        assert_eq!(target.platform(), Platform::new(Os::Linux, Arch::X86_64));
        assert_eq!(
            target.url,
            "https://mirror.example.com/dl/v2.0.0/stratus-red-team_2.0.0_Linux_x86_64.tar.gz"
        );
        assert_eq!(target.sha256.as_str(), "3".repeat(64));
    }

    #[test]
    fn test_from_checksums_without_matches_fails() {
        let err = Formula::from_checksums("9.9.9", DEFAULT_DOWNLOAD_BASE, CHECKSUMS_1_3_0)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FormulaError>(),
            Some(&FormulaError::NoTargets)
        );
    }

    #[test]
    fn test_from_checksums_rejects_duplicates() {
        let listing = format!("{}{}", CHECKSUMS_1_3_0, CHECKSUMS_1_3_0.lines().next().unwrap());
        let err =
            Formula::from_checksums("1.3.0", DEFAULT_DOWNLOAD_BASE, &listing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormulaError>(),
            Some(FormulaError::DuplicateTarget(_))
        ));
    }

    #[test]
    fn test_from_checksums_malformed_line() {
        let err = Formula::from_checksums("1.3.0", DEFAULT_DOWNLOAD_BASE, "deadbeef\n")
            .unwrap_err();
        assert!(err.to_string().contains("Malformed checksums line 1"));
    }

    #[test]
    fn test_from_checksums_bad_hash() {
        let err = Formula::from_checksums(
            "1.3.0",
            DEFAULT_DOWNLOAD_BASE,
            "xyz  stratus-red-team_1.3.0_Linux_x86_64.tar.gz\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Bad checksum"));
    }
}
