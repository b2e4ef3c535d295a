use anyhow::Result;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    archive::{self, Extractor},
    checksum::verify_archive,
    cleanup::{self, CleanupGuard, SharedCleanupContext},
    download::Downloader,
    formula::{Formula, ReleaseTarget},
    platform::{self, PlatformDetector},
    runtime::Runtime,
};

use super::paths::{get_bin_dir, partial_path, work_dir};

static WORK_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Pipeline states, entered strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Downloading,
    Verifying,
    Extracting,
    Installing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::Downloading => "downloading",
            Stage::Verifying => "verifying",
            Stage::Extracting => "extracting",
            Stage::Installing => "installing",
            Stage::Done => "installed",
        };
        f.write_str(name)
    }
}

pub struct Installer<R: Runtime, D: Downloader, E: Extractor, P: PlatformDetector> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    pub detector: P,
}

impl<R: Runtime, D: Downloader, E: Extractor, P: PlatformDetector> Installer<R, D, E, P> {
    #[tracing::instrument(skip(runtime, downloader, extractor, detector))]
    pub fn new(runtime: R, downloader: D, extractor: E, detector: P) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            detector,
        }
    }

    /// Resolve, download, verify, extract and place the formula's binary.
    ///
    /// Returns the installed path. Any failure aborts the remaining stages
    /// and leaves the bin directory as it was.
    #[tracing::instrument(skip(self, formula, bin_dir))]
    pub async fn install(&self, formula: &Formula, bin_dir: Option<PathBuf>) -> Result<PathBuf> {
        // Set up cleanup context for Ctrl-C handling
        let cleanup_ctx = cleanup::new_shared();
        let cleanup_ctx_clone = Arc::clone(&cleanup_ctx);

        let ctrl_c_handler = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, cleaning up...");
                if let Ok(ctx) = cleanup_ctx_clone.lock() {
                    ctx.cleanup();
                }
                std::process::exit(130); // Standard exit code for Ctrl-C
            }
        });

        let result = self.run(formula, bin_dir, cleanup_ctx).await;

        // Installation finished (successfully or with error)
        ctrl_c_handler.abort();

        result
    }

    async fn run(
        &self,
        formula: &Formula,
        bin_dir: Option<PathBuf>,
        cleanup_ctx: SharedCleanupContext,
    ) -> Result<PathBuf> {
        self.enter(Stage::Resolving, &format!("{} {}", formula.name, formula.version));
        let host = self.detector.detect();
        debug!("Detected host: {:?}", host);
        let target = platform::resolve(formula, &host)?;
        info!("Resolved {} to {}", target.platform(), target.url);

        let bin_dir = get_bin_dir(&self.runtime, bin_dir)?;

        let work_dir = work_dir(&self.runtime, WORK_DIR_SEQ.fetch_add(1, Ordering::Relaxed));
        if self.runtime.exists(&work_dir) {
            self.runtime.remove_dir_all(&work_dir)?;
        }
        self.runtime.create_dir_all(&work_dir)?;
        let work_guard = CleanupGuard::new(Arc::clone(&cleanup_ctx), work_dir.clone());

        let result = self
            .fetch_and_place(formula, target, &work_dir, &bin_dir, &cleanup_ctx)
            .await;

        if let Err(e) = self.runtime.remove_dir_all(&work_dir) {
            warn!("Failed to remove work directory {:?}: {}", work_dir, e);
        }
        work_guard.release();

        let installed = result?;
        self.enter(Stage::Done, &installed.display().to_string());
        Ok(installed)
    }

    async fn fetch_and_place(
        &self,
        formula: &Formula,
        target: &ReleaseTarget,
        work_dir: &Path,
        bin_dir: &Path,
        cleanup_ctx: &SharedCleanupContext,
    ) -> Result<PathBuf> {
        let archive_name = match target.archive_name() {
            "" => "archive",
            name => name,
        };
        let archive_path = work_dir.join(archive_name);
        if !self.extractor.can_handle(&archive_path) {
            return Err(archive::corrupt(&archive_path, "unsupported archive format"));
        }

        self.enter(Stage::Downloading, &target.url);
        self.downloader
            .download(&self.runtime, &target.url, &archive_path)
            .await?;

        self.enter(Stage::Verifying, target.sha256.as_str());
        verify_archive(&self.runtime, &archive_path, target)?;

        self.enter(Stage::Extracting, &formula.binary);
        let extracted = work_dir.join(&formula.binary);
        self.extractor
            .extract_binary(&self.runtime, &archive_path, &formula.binary, &extracted)?;

        self.enter(Stage::Installing, &bin_dir.display().to_string());
        self.place(&extracted, bin_dir, &formula.binary, cleanup_ctx)
    }

    /// Copy into a hidden partial file in `bin_dir`, mark it executable,
    /// then rename it over the final name.
    #[tracing::instrument(skip(self, cleanup_ctx))]
    fn place(
        &self,
        extracted: &Path,
        bin_dir: &Path,
        binary: &str,
        cleanup_ctx: &SharedCleanupContext,
    ) -> Result<PathBuf> {
        if !self.runtime.exists(bin_dir) {
            info!("Creating bin directory {:?}", bin_dir);
            self.runtime.create_dir_all(bin_dir)?;
        }

        let partial = partial_path(bin_dir, binary);
        let dest = bin_dir.join(binary);
        let partial_guard = CleanupGuard::new(Arc::clone(cleanup_ctx), partial.clone());

        let placed = self
            .runtime
            .copy(extracted, &partial)
            .and_then(|_| self.runtime.set_permissions(&partial, 0o755))
            .and_then(|_| self.runtime.rename(&partial, &dest));

        if placed.is_err() && self.runtime.exists(&partial) {
            let _ = self.runtime.remove_file(&partial);
        }
        partial_guard.release();

        placed?;
        debug!("Placed {:?}", dest);
        Ok(dest)
    }

    fn enter(&self, stage: Stage, detail: &str) {
        info!("Stage: {:?}", stage);
        println!("   {} {}", stage, detail);
    }
}
