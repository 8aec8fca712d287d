//! Console reporting for CLI sync runs.

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::{
    FileStats, PlanStats, RunSummary, SyncProgress, format_bytes, format_duration,
    format_position,
};

const SEPARATOR: &str = "========================================";

/// Creates a spinner for the item being downloaded.
///
/// Sizes are not requested from the listing, so the bar counts bytes
/// without a total.
pub fn make_progress_bar(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {bytes} @ {bytes_per_sec} - {msg}")
            .expect("progress template is valid"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Plan summary shown before any transfer.
///
/// Local files that match no remote item make `remaining` smaller than the
/// actual work set, so the queue size is shown as well when they differ.
pub fn plan_lines(stats: &PlanStats) -> Vec<String> {
    let mut lines = vec![
        SEPARATOR.to_string(),
        format!("PROGRESS: {} / {} files collected.", stats.already_done, stats.total),
        format!("Remaining: {} files.", stats.remaining),
    ];
    if stats.pending != stats.remaining {
        lines.push(format!("Queued for download: {} files.", stats.pending));
    }
    lines.push(SEPARATOR.to_string());
    lines
}

/// Final summary lines.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();

    if summary.files_downloaded > 0 {
        lines.push(format!(
            "Downloaded {} file(s), {} in {} ({}/s avg)",
            summary.files_downloaded,
            format_bytes(summary.total_bytes),
            format_duration(summary.elapsed),
            format_bytes(summary.average_speed()),
        ));
    }

    if summary.failed.is_empty() {
        if summary.files_downloaded == 0 {
            lines.push("Nothing to download, all files are present.".to_string());
        }
    } else {
        lines.push(format!(
            "Done with {} error(s). Run again to retry them:",
            summary.failed.len()
        ));
        lines.extend(
            summary
                .failed
                .iter()
                .map(|f| format!("  {} ({})", f.name, f.error)),
        );
    }
    lines
}

/// Prints plan, per-item events and the final summary to the terminal.
pub struct ConsoleProgress {
    current: Mutex<Option<ProgressBar>>,
    draw_bars: bool,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgress {
    /// Creates a reporter that draws spinners when stderr is a terminal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            draw_bars: console::Term::stderr().is_term(),
        }
    }

    /// Prints a line without tearing the active spinner.
    fn println(&self, line: &str) {
        match self.current.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.current.lock().ok().and_then(|mut c| c.take()) {
            bar.finish_and_clear();
        }
    }
}

impl SyncProgress for ConsoleProgress {
    fn on_plan(&self, stats: &PlanStats) {
        println!();
        for line in plan_lines(stats) {
            println!("{line}");
        }
        println!();
    }

    fn on_item_start(&self, _index: usize, _total: usize, name: &str) {
        let bar = make_progress_bar(name);
        if self.draw_bars {
            bar.enable_steady_tick(Duration::from_millis(250));
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(mut current) = self.current.lock() {
            if let Some(old) = current.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_bytes(&self, _name: &str, bytes_delta: u64) {
        if let Some(bar) = self.current.lock().ok().as_deref().and_then(Option::as_ref) {
            bar.inc(bytes_delta);
        }
    }

    fn on_retry(&self, index: usize, total: usize, name: &str, attempt: u32, _error: &str) {
        self.println(&format!(
            "{} {} Glitch on {name}, retrying... (Attempt {attempt})",
            format_position(index, total),
            style("!").yellow(),
        ));
        if let Some(bar) = self.current.lock().ok().as_deref().and_then(Option::as_ref) {
            bar.set_position(0);
        }
    }

    fn on_complete(&self, index: usize, total: usize, name: &str, stats: &FileStats) {
        self.finish_bar();
        println!(
            "{} {} Success: {name} ({})",
            format_position(index, total),
            style("✓").green(),
            format_bytes(stats.size),
        );
    }

    fn on_failed(&self, index: usize, total: usize, name: &str, _error: &str) {
        self.finish_bar();
        println!(
            "{} {} Failed: {name}",
            format_position(index, total),
            style("✗").red(),
        );
    }

    fn on_finish(&self, summary: &RunSummary) {
        self.finish_bar();
        let lines = summary_lines(summary);
        if lines.is_empty() {
            return;
        }
        println!();
        for line in lines {
            println!("{line}");
        }
    }
}
