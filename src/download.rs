//! Core transfer logic and progress reporting.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::config::{CommitMode, SyncConfig};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::plan::{Plan, PlanStats, WorkItem};
use crate::remote::{DriveSession, timed};
use crate::retry::with_retries;
use crate::stats::{FailedItem, FileStats, RunSummary, RunSummaryBuilder, TransferTracker};

/// Result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file was downloaded during this call.
    Completed(FileStats),
    /// The target path already existed; nothing was fetched.
    Skipped,
    /// Every attempt failed; carries the last error.
    Failed(String),
}

/// Trait for receiving sync progress updates.
///
/// All methods have default no-op implementations. `index` is the item's
/// 1-based position and `total` the number of transferable items.
pub trait SyncProgress: Send + Sync {
    /// Called once the work set is known, before any transfer.
    fn on_plan(&self, _stats: &PlanStats) {}

    /// Called before the first attempt of an item.
    fn on_item_start(&self, _index: usize, _total: usize, _name: &str) {}

    /// Called with the number of bytes written since the last call.
    fn on_bytes(&self, _name: &str, _bytes_delta: u64) {}

    /// Called when an attempt failed and another one will follow.
    fn on_retry(&self, _index: usize, _total: usize, _name: &str, _attempt: u32, _error: &str) {}

    /// Called when an item was downloaded.
    fn on_complete(&self, _index: usize, _total: usize, _name: &str, _stats: &FileStats) {}

    /// Called when an item exhausted its attempts.
    fn on_failed(&self, _index: usize, _total: usize, _name: &str, _error: &str) {}

    /// Called once at the end of a run.
    fn on_finish(&self, _summary: &RunSummary) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl SyncProgress for NoProgress {}

/// Returns the `.part` path used while a download is in flight.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Rejects names that would escape the target directory or cannot be a
/// single path component.
fn check_file_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        Err(Error::UnsafeName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Sequential downloader for planned work items.
pub struct Downloader<S, F = TokioFileSystem> {
    session: S,
    config: SyncConfig,
    fs: F,
}

impl<S: DriveSession> Downloader<S, TokioFileSystem> {
    /// Creates a new downloader with the default file system.
    #[must_use]
    pub const fn new(session: S, config: SyncConfig) -> Self {
        Self {
            session,
            config,
            fs: TokioFileSystem,
        }
    }
}

impl<S: DriveSession, F: FileSystem> Downloader<S, F> {
    /// Creates a new downloader with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(session: S, config: SyncConfig, fs: F) -> Self {
        Self {
            session,
            config,
            fs,
        }
    }

    /// Returns a reference to the remote session.
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Returns a reference to the file system.
    #[must_use]
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    /// Returns a reference to the sync configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Downloads one item, retrying failed attempts.
    ///
    /// Names that cannot be a single path component are refused first. An
    /// item whose final path already exists is then skipped without touching
    /// the network. Failures never escape as errors; they are reported as
    /// [`TransferOutcome::Failed`].
    pub async fn transfer(
        &self,
        item: &WorkItem,
        total: usize,
        progress: &dyn SyncProgress,
    ) -> TransferOutcome {
        let name = item.name();

        if let Err(e) = check_file_name(name) {
            log::error!("[{}/{total}] {e}", item.index);
            progress.on_failed(item.index, total, name, &e.to_string());
            return TransferOutcome::Failed(e.to_string());
        }

        if self.fs.path_exists(&item.path).await {
            log::debug!("Skipping {name}: already present");
            return TransferOutcome::Skipped;
        }

        let write_path = match self.config.commit_mode {
            CommitMode::Atomic => part_path(&item.path),
            CommitMode::InPlace => item.path.clone(),
        };

        log::debug!("Fetching {name} ({})", item.item.mime_type);
        progress.on_item_start(item.index, total, name);

        let write_to = write_path.as_path();
        let result = with_retries(
            self.config.max_attempts,
            self.config.retry_delay(),
            |attempt| self.attempt(item, write_to, attempt, progress),
            |attempt, e| {
                log::warn!("Attempt {attempt} for {name} failed: {e}");
                progress.on_retry(item.index, total, name, attempt, &e.to_string());
            },
        )
        .await;

        match result {
            Ok(stats) => {
                log::info!("Downloaded {name} ({} bytes)", stats.size);
                progress.on_complete(item.index, total, name, &stats);
                TransferOutcome::Completed(stats)
            }
            Err(e) => {
                if self.config.commit_mode == CommitMode::Atomic && self.config.cleanup_on_error {
                    let _ = self.fs.remove_file(&write_path).await;
                }
                log::error!(
                    "Giving up on {name} after {} attempt(s): {e}",
                    self.config.max_attempts.max(1)
                );
                progress.on_failed(item.index, total, name, &e.to_string());
                TransferOutcome::Failed(e.to_string())
            }
        }
    }

    /// One attempt: truncate the write path, stream the body into it, and
    /// commit. The file handle is dropped on every exit path.
    async fn attempt(
        &self,
        item: &WorkItem,
        write_path: &Path,
        attempt: u32,
        progress: &dyn SyncProgress,
    ) -> Result<FileStats> {
        log::debug!("Attempt {attempt} for {} ({})", item.name(), item.item.id);
        let timeout = self.config.network_timeout();

        let mut file = self.fs.create_file(write_path).await?;
        let mut chunks = timed(timeout, self.session.open_download(&item.item.id)).await?;
        let mut tracker = TransferTracker::new();

        while let Some(chunk) = timed(timeout, async { chunks.next().await.transpose() }).await? {
            file.write_all(&chunk).await?;
            tracker.record_bytes(chunk.len() as u64);
            progress.on_bytes(item.name(), chunk.len() as u64);
        }
        file.flush().await?;
        drop(file);

        if write_path != item.path {
            self.fs.rename_file(write_path, &item.path).await?;
        }
        Ok(tracker.into_file_stats(attempt))
    }

    /// Processes every planned item in order, one at a time.
    ///
    /// Individual failures do not stop the run; they are collected in the
    /// returned summary.
    pub async fn download_all(&self, plan: &Plan, progress: &dyn SyncProgress) -> RunSummary {
        let total = plan.stats.total;
        let mut builder = RunSummaryBuilder::new(total, plan.stats.already_done);

        for item in &plan.work {
            match self.transfer(item, total, progress).await {
                TransferOutcome::Completed(stats) => builder.add_download(&stats),
                TransferOutcome::Skipped => builder.add_skipped(),
                TransferOutcome::Failed(error) => builder.add_failure(FailedItem {
                    id: item.item.id.clone(),
                    name: item.name().to_string(),
                    error,
                }),
            }
        }

        builder.build()
    }
}
