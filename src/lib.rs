//! gdrive-dl - incremental download of a Google Drive folder.
//!
//! Lists the children of a remote folder, compares them with the files already
//! present in a local directory, and downloads the missing ones one at a time
//! with bounded retries. Running it again picks up whatever is still missing.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gdrive_dl::{DriveClient, Downloader, NoProgress, SyncConfig, sync_folder};
//!
//! # async fn example() -> gdrive_dl::Result<()> {
//! let config = SyncConfig::default();
//! let http = gdrive_dl::build_http_client(config.network_timeout())?;
//! let client = DriveClient::new(http, "ya29.access-token");
//!
//! let downloader = Downloader::new(client, config);
//! let summary = sync_folder(&downloader, "folder-id", Path::new("Photos"), &NoProgress).await?;
//! println!("Downloaded {} files, {} failed", summary.files_downloaded, summary.failed.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod auth;
pub mod config;
pub mod download;
pub mod drive;
pub mod error;
pub mod format;
pub mod fs;
pub mod plan;
pub mod remote;
pub mod retry;
pub mod stats;
pub mod sync;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use auth::{AuthorizedUser, access_token};
pub use config::{AppConfig, AuthConfig, CommitMode, SyncConfig};
pub use download::{Downloader, NoProgress, SyncProgress, TransferOutcome};
pub use drive::{DriveClient, build_http_client};
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration, format_position};
pub use fs::{FileSystem, TokioFileSystem, ensure_dir, existing_names};
pub use plan::{Plan, PlanStats, WorkItem, plan};
pub use remote::{ChunkStream, DriveSession, ItemKind, ListPage, RemoteItem, list_children};
pub use retry::with_retries;
pub use stats::{FailedItem, FileStats, RunSummary};
pub use sync::sync_folder;
