use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::runtime::Runtime;

use super::{Extractor, binary_depth, corrupt, missing_binary};

/// Extractor for .zip archives
#[derive(Default)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".zip")
    }

    fn extract_binary<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        debug!("Looking for '{}' in {:?}...", binary_name, archive_path);
        let mut file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip needs Read + Seek; Runtime::open only gives Read
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .map_err(|e| corrupt(archive_path, format!("unreadable zip: {}", e)))?;

        let mut best: Option<(usize, usize)> = None;
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| corrupt(archive_path, format!("bad zip entry {}: {}", index, e)))?;
            if !entry.is_file() {
                continue;
            }
            let Some(depth) = entry
                .enclosed_name()
                .and_then(|path| binary_depth(&path, binary_name))
            else {
                continue;
            };
            if best.is_none_or(|(best_depth, _)| depth < best_depth) {
                best = Some((depth, index));
            }
        }

        let (_, index) = best.ok_or_else(|| missing_binary(archive_path, binary_name))?;
        let mut entry = archive
            .by_index(index)
            .map_err(|e| corrupt(archive_path, format!("bad zip entry {}: {}", index, e)))?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(|e| {
            corrupt(
                archive_path,
                format!("failed to read '{}': {}", entry.name(), e),
            )
        })?;

        runtime
            .write(dest, &content)
            .with_context(|| format!("Failed to write extracted binary to {:?}", dest))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::zip;
    use crate::error::InstallError;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_can_handle_zip() {
        let extractor = ZipExtractor;
        assert!(extractor.can_handle(Path::new("file.zip")));
        assert!(extractor.can_handle(Path::new("FILE.ZIP")));
        assert!(!extractor.can_handle(Path::new("file.tar.gz")));
        assert!(!extractor.can_handle(Path::new("file.tgz")));
    }

    #[test]
    fn test_extracts_shallowest_binary() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("release.zip");
        fs::write(
            &archive,
            zip(&[
                ("pkg/bin/stratus", "deep"),
                ("pkg/stratus", "shallow"),
                ("LICENSE", "Apache"),
            ]),
        )
        .unwrap();

        let dest = dir.path().join("out");
        ZipExtractor
            .extract_binary(&RealRuntime, &archive, "stratus", &dest)
            .unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"shallow");
    }

    #[test]
    fn test_missing_binary_is_corrupt_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("release.zip");
        fs::write(&archive, zip(&[("README.md", "readme")])).unwrap();

        let dest = dir.path().join("out");
        let err = ZipExtractor
            .extract_binary(&RealRuntime, &archive, "stratus", &dest)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::CorruptArchive { .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_garbage_is_corrupt_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("release.zip");
        fs::write(&archive, b"PK but not really").unwrap();

        let err = ZipExtractor
            .extract_binary(&RealRuntime, &archive, "stratus", &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::CorruptArchive { .. })
        ));
    }
}
