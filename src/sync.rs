//! One complete run: list, reconcile, transfer, report.

use std::path::Path;

use crate::download::{Downloader, SyncProgress};
use crate::error::Result;
use crate::fs::{FileSystem, ensure_dir, existing_names};
use crate::plan::plan;
use crate::remote::{DriveSession, list_children};
use crate::stats::RunSummary;

/// Mirrors the transferable children of `folder_id` into `target_dir`.
///
/// The listing and the local inventory are both taken fresh; nothing is
/// cached between runs. Running again after a partial failure retries only
/// the items whose final file is still missing.
///
/// # Errors
///
/// Returns an error only for setup failures: the listing could not be
/// completed or the target directory could not be created or read. Failed
/// transfers are reported in the summary instead.
pub async fn sync_folder<S, F>(
    downloader: &Downloader<S, F>,
    folder_id: &str,
    target_dir: &Path,
    progress: &dyn SyncProgress,
) -> Result<RunSummary>
where
    S: DriveSession,
    F: FileSystem,
{
    let config = downloader.config();
    log::info!("Syncing folder {folder_id} into {}", target_dir.display());

    ensure_dir(downloader.fs(), target_dir).await?;

    let items = list_children(
        downloader.session(),
        folder_id,
        config.page_size,
        config.network_timeout(),
    )
    .await?;
    let existing = existing_names(downloader.fs(), target_dir).await?;

    let plan = plan(&items, &existing, target_dir);
    progress.on_plan(&plan.stats);

    let summary = downloader.download_all(&plan, progress).await;
    log::info!(
        "Run finished: {} downloaded, {} skipped, {} failed",
        summary.files_downloaded,
        summary.files_skipped,
        summary.failed.len()
    );
    progress.on_finish(&summary);
    Ok(summary)
}
