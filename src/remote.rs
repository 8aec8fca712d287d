//! Remote folder model and paginated listing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::{Error, Result};

/// Whether a remote item has a direct byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A regular file that can be downloaded as-is.
    Transferable,
    /// A remote-native document or folder with no single binary form.
    NonTransferable,
}

impl ItemKind {
    /// Classifies a Drive MIME type. Every `application/vnd.google-apps.*`
    /// type (Docs, Sheets, folders, shortcuts) has no direct download.
    #[must_use]
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type.contains("google-apps") {
            Self::NonTransferable
        } else {
            Self::Transferable
        }
    }

    /// Returns true for [`ItemKind::Transferable`].
    #[must_use]
    pub const fn is_transferable(self) -> bool {
        matches!(self, Self::Transferable)
    }
}

/// A child of the remote folder, as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Remote-assigned identifier, the only handle used for downloads.
    pub id: String,
    /// Display name, used verbatim as the local file name.
    pub name: String,
    /// Raw MIME type as reported by the remote.
    pub mime_type: String,
    /// Derived from `mime_type`.
    pub kind: ItemKind,
}

impl RemoteItem {
    /// Creates an item, deriving its kind from the MIME type.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            name: name.into(),
            kind: ItemKind::from_mime_type(&mime_type),
            mime_type,
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Items on this page.
    pub items: Vec<RemoteItem>,
    /// Continuation token; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// A download body, pulled chunk by chunk.
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// An authenticated session against the remote storage.
///
/// Token acquisition and refresh happen before a session is built; by the
/// time the sync engine holds one it is ready to use.
#[async_trait]
pub trait DriveSession: Send + Sync {
    /// Fetches one page of the children of `folder_id`.
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ListPage>;

    /// Opens a streaming download of the item's content.
    async fn open_download(&self, item_id: &str) -> Result<ChunkStream>;
}

/// Runs a network call under `timeout`, mapping expiry to [`Error::Timeout`].
pub(crate) async fn timed<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

/// Lists every child of `folder_id`, following continuation tokens until the
/// last page.
///
/// # Errors
///
/// Returns [`Error::RemoteList`] if any page fails; nothing from earlier pages
/// is returned in that case.
pub async fn list_children<S: DriveSession + ?Sized>(
    session: &S,
    folder_id: &str,
    page_size: u32,
    timeout: Duration,
) -> Result<Vec<RemoteItem>> {
    let wrap = |source: Error| Error::RemoteList {
        folder_id: folder_id.to_string(),
        source: Box::new(source),
    };

    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = timed(
            timeout,
            session.list_page(folder_id, page_token.as_deref(), page_size),
        )
        .await
        .map_err(wrap)?;
        pages += 1;
        log::debug!(
            "Listed page {pages} of {folder_id}: {} item(s)",
            page.items.len()
        );
        items.extend(page.items);

        match page.next_page_token {
            Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                return Err(wrap(Error::Protocol(format!(
                    "listing returned the same page token twice: {next}"
                ))));
            }
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    log::info!("Listed {} item(s) in {pages} page(s)", items.len());
    Ok(items)
}
