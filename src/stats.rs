//! Transfer statistics types.

use std::time::{Duration, Instant};

/// Statistics for a single completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes written to disk.
    pub size: u64,
    /// Time taken by the successful attempt.
    pub elapsed: Duration,
    /// Average speed of the successful attempt, in bytes per second.
    pub average_speed: u64,
    /// Attempt number that succeeded (1-based).
    pub attempts: u32,
}

/// An item that exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Remote identifier.
    pub id: String,
    /// Remote name, also the intended local file name.
    pub name: String,
    /// Error of the last attempt.
    pub error: String,
}

/// Outcome of a whole sync run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Transferable items in the listing.
    pub total: usize,
    /// Local files present before the run started.
    pub already_done: usize,
    /// Items transferred during this run.
    pub files_downloaded: usize,
    /// Items skipped because their path appeared before they were attempted.
    pub files_skipped: usize,
    /// Items that exhausted their attempts, in processing order.
    pub failed: Vec<FailedItem>,
    /// Bytes written by successful transfers.
    pub total_bytes: u64,
    /// Wall time of the transfer loop.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Returns true if no item permanently failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the average download speed in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> u64 {
        bytes_per_second(self.total_bytes, self.elapsed)
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn bytes_per_second(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

/// Tracks one transfer attempt while bytes arrive.
pub struct TransferTracker {
    start_time: Instant,
    written: u64,
}

impl Default for TransferTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferTracker {
    /// Starts tracking now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            written: 0,
        }
    }

    /// Records bytes written to disk.
    pub const fn record_bytes(&mut self, bytes: u64) {
        self.written += bytes;
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Converts this tracker into final file statistics.
    #[must_use]
    pub fn into_file_stats(self, attempts: u32) -> FileStats {
        let elapsed = self.start_time.elapsed();
        FileStats {
            size: self.written,
            elapsed,
            average_speed: bytes_per_second(self.written, elapsed),
            attempts,
        }
    }
}

/// Accumulates a [`RunSummary`] while the transfer loop runs.
pub struct RunSummaryBuilder {
    summary: RunSummary,
    start_time: Instant,
}

impl RunSummaryBuilder {
    /// Starts a summary for a run with the given plan counters.
    #[must_use]
    pub fn new(total: usize, already_done: usize) -> Self {
        Self {
            summary: RunSummary {
                total,
                already_done,
                ..RunSummary::default()
            },
            start_time: Instant::now(),
        }
    }

    /// Records a completed transfer.
    pub const fn add_download(&mut self, stats: &FileStats) {
        self.summary.files_downloaded += 1;
        self.summary.total_bytes += stats.size;
    }

    /// Records a skipped item.
    pub const fn add_skipped(&mut self) {
        self.summary.files_skipped += 1;
    }

    /// Records a permanently failed item.
    pub fn add_failure(&mut self, failed: FailedItem) {
        self.summary.failed.push(failed);
    }

    /// Builds the final summary.
    #[must_use]
    pub fn build(mut self) -> RunSummary {
        self.summary.elapsed = self.start_time.elapsed();
        self.summary
    }
}
