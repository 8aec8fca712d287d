//! Google Drive v3 REST session.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::remote::{ChunkStream, DriveSession, ListPage, RemoteItem};

/// Public Drive API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Only the fields the sync engine reads.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
}

impl From<DriveFile> for RemoteItem {
    fn from(file: DriveFile) -> Self {
        Self::new(file.id, file.name, file.mime_type)
    }
}

/// Builds the HTTP client used for Drive requests.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

/// A [`DriveSession`] backed by the Drive v3 REST API and a bearer token.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl DriveClient {
    /// Creates a client against the public Drive endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL, access_token)
    }

    /// Creates a client against another endpoint, such as a local mock server.
    #[must_use]
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: &str,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(Error::Api { status, body })
        }
    }
}

#[async_trait]
impl DriveSession for DriveClient {
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ListPage> {
        let query = format!("'{}' in parents", folder_id.replace('\'', "\\'"));
        let page_size = page_size.to_string();
        let mut params = vec![
            ("q", query.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .http
            .get(self.files_url())
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await?;
        let body = Self::check(response).await?.bytes().await?;
        let payload: FileListResponse = serde_json::from_slice(&body)?;

        Ok(ListPage {
            items: payload.files.into_iter().map(RemoteItem::from).collect(),
            next_page_token: payload.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn open_download(&self, item_id: &str) -> Result<ChunkStream> {
        let response = self
            .http
            .get(format!("{}/{item_id}", self.files_url()))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let chunks = stream::try_unfold(response, |mut response| async move {
            let chunk = response.chunk().await?;
            Ok::<_, reqwest::Error>(chunk.map(|chunk| (chunk, response)))
        });
        Ok(chunks.map_err(Error::from).boxed())
    }
}
