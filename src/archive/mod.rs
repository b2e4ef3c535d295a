mod tar_gz;
mod zip;

use anyhow::Result;
use std::path::{Component, Path};

use crate::error::InstallError;
use crate::runtime::Runtime;

pub use self::tar_gz::TarGzExtractor;
pub use self::zip::ZipExtractor;

/// Pulls the release binary out of a downloaded archive.
pub trait Extractor: Send + Sync {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Write the entry named `binary_name` to `dest`.
    ///
    /// The entry is the shallowest regular file whose file name equals
    /// `binary_name`. An unreadable archive or a missing entry is an
    /// [`InstallError::CorruptArchive`]; nothing is written in that case.
    fn extract_binary<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()>;
}

/// Dispatcher that selects the appropriate extractor based on archive format.
#[derive(Default)]
pub struct ArchiveExtractor {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extractor for ArchiveExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract_binary<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        archive_path: &Path,
        binary_name: &str,
        dest: &Path,
    ) -> Result<()> {
        if self.tar_gz.can_handle(archive_path) {
            return self
                .tar_gz
                .extract_binary(runtime, archive_path, binary_name, dest);
        }
        if self.zip.can_handle(archive_path) {
            return self
                .zip
                .extract_binary(runtime, archive_path, binary_name, dest);
        }
        Err(corrupt(archive_path, "unsupported archive format"))
    }
}

pub(crate) fn corrupt(archive_path: &Path, reason: impl Into<String>) -> anyhow::Error {
    InstallError::CorruptArchive {
        archive: archive_path.display().to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn missing_binary(archive_path: &Path, binary_name: &str) -> anyhow::Error {
    corrupt(archive_path, format!("no entry named '{}'", binary_name))
}

/// Depth of `entry_path` if its file name is `binary_name`.
///
/// `./` prefixes do not count towards depth; paths escaping the archive
/// root never match.
pub(crate) fn binary_depth(entry_path: &Path, binary_name: &str) -> Option<usize> {
    let mut depth = 0;
    for component in entry_path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            _ => return None,
        }
    }
    (entry_path.file_name()? == binary_name).then_some(depth)
}

#[cfg(test)]
pub(crate) mod test_support {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    /// Build a .tar.gz in memory from `(path, content, mode)` regular files.
    pub fn tar_gz(files: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder.append(&header, content.as_bytes()).unwrap();
        }
        let tar = builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    /// Build a .zip in memory from `(path, content)` files.
    pub fn zip(files: &[(&str, &str)]) -> Vec<u8> {
        use ::zip::CompressionMethod;
        use ::zip::ZipWriter;
        use ::zip::write::FileOptions;

        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}
