//! Reconciliation of a remote listing against local state.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::remote::RemoteItem;

/// A remote item scheduled for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The item to fetch.
    pub item: RemoteItem,
    /// Final local path (`target_dir/name`).
    pub path: PathBuf,
    /// 1-based position among the transferable items of the listing.
    pub index: usize,
}

impl WorkItem {
    /// Display name of the underlying item.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.item.name
    }
}

/// Counters reported before any transfer starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanStats {
    /// Transferable items in the listing.
    pub total: usize,
    /// Regular files already in the target directory, whether listed or not.
    pub already_done: usize,
    /// `total - already_done`, floored at zero.
    pub remaining: usize,
    /// Items that will actually be attempted.
    pub pending: usize,
}

/// The work derived from one listing.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Items to transfer, in listing order.
    pub work: Vec<WorkItem>,
    /// Progress counters.
    pub stats: PlanStats,
}

/// Computes which transferable items are missing from `existing`.
///
/// `already_done` counts every local file, not only those matching a remote
/// name. Listing order is preserved.
#[must_use]
pub fn plan(items: &[RemoteItem], existing: &HashSet<String>, target_dir: &Path) -> Plan {
    let transferable: Vec<&RemoteItem> = items
        .iter()
        .filter(|i| {
            if !i.kind.is_transferable() {
                log::debug!("Excluding {} ({}): no direct download", i.name, i.mime_type);
            }
            i.kind.is_transferable()
        })
        .collect();
    let total = transferable.len();

    let work: Vec<WorkItem> = transferable
        .into_iter()
        .enumerate()
        .filter(|(_, item)| !existing.contains(&item.name))
        .map(|(pos, item)| WorkItem {
            item: item.clone(),
            path: target_dir.join(&item.name),
            index: pos + 1,
        })
        .collect();

    warn_duplicate_names(&work);

    let stats = PlanStats {
        total,
        already_done: existing.len(),
        remaining: total.saturating_sub(existing.len()),
        pending: work.len(),
    };
    log::info!(
        "Plan: {} eligible, {} present locally, {} to transfer",
        stats.total,
        stats.already_done,
        stats.pending
    );

    Plan { work, stats }
}

fn warn_duplicate_names(work: &[WorkItem]) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for item in work {
        *seen.entry(item.name()).or_default() += 1;
    }
    for (name, count) in seen.into_iter().filter(|(_, count)| *count > 1) {
        log::warn!("{count} remote items share the name {name:?}; only the first will be kept");
    }
}
