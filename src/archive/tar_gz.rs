use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::debug;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::runtime::Runtime;

use super::{Extractor, binary_depth, corrupt, missing_binary};

/// Extractor for .tar.gz / .tgz archives
#[derive(Default)]
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract_binary<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        debug!("Looking for '{}' in {:?}...", binary_name, archive_path);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let entries = archive
            .entries()
            .map_err(|e| corrupt(archive_path, format!("unreadable tar stream: {}", e)))?;

        // Single pass over the stream: keep the shallowest match seen so far.
        let mut found: Option<(usize, Vec<u8>)> = None;
        for entry in entries {
            let mut entry =
                entry.map_err(|e| corrupt(archive_path, format!("bad tar entry: {}", e)))?;

            if !entry.header().entry_type().is_file() {
                continue;
            }
            let entry_path = entry
                .path()
                .map_err(|e| corrupt(archive_path, format!("bad entry path: {}", e)))?
                .into_owned();
            let Some(depth) = binary_depth(&entry_path, binary_name) else {
                continue;
            };
            if found.as_ref().is_some_and(|(best, _)| *best <= depth) {
                continue;
            }

            debug!("Found {:?} at depth {}", entry_path, depth);
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(|e| {
                corrupt(
                    archive_path,
                    format!("failed to read {:?}: {}", entry_path, e),
                )
            })?;
            found = Some((depth, content));

            if depth == 1 {
                break;
            }
        }

        let (_, content) = found.ok_or_else(|| missing_binary(archive_path, binary_name))?;
        runtime
            .write(dest, &content)
            .with_context(|| format!("Failed to write extracted binary to {:?}", dest))?;
        Ok(())
    }
}
