//! Access-token acquisition for the Drive session.
//!
//! Tokens come from `GDRIVE_ACCESS_TOKEN` or from an authorized-user
//! `token.json` (the format written by Google's client libraries after the
//! consent flow). Expired tokens are renewed with the stored refresh token and
//! the file is rewritten in place. The interactive consent flow itself is not
//! handled here.

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Environment variable holding a ready-to-use access token.
pub const TOKEN_ENV: &str = "GDRIVE_ACCESS_TOKEN";

/// Token endpoint used when the file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed ahead of time.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Contents of an authorized-user token file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Current access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Long-lived refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// OAuth token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    /// OAuth client id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Expiry of `token`; absent means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields this crate does not use, kept so rewriting the file loses nothing.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl AuthorizedUser {
    /// Reads a token file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Auth(format!("invalid token file {}: {e}", path.display())))
    }

    /// Writes the token file atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Returns the access token if it is present and not about to expire.
    #[must_use]
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        match self.expiry {
            Some(expiry) if expiry <= now + TimeDelta::seconds(EXPIRY_MARGIN_SECS) => None,
            _ => Some(token),
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if no refresh token is stored or the token
    /// endpoint rejects the request.
    pub async fn refresh(&mut self, http: &reqwest::Client, now: DateTime<Utc>) -> Result<()> {
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Auth("token expired and no refresh token is stored".into()))?;
        let token_uri = self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if let Some(id) = self.client_id.as_deref() {
            form.push(("client_id", id));
        }
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        log::info!("Refreshing access token via {token_uri}");
        let response = http.post(token_uri).form(&form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("token refresh returned {status}: {body}")));
        }
        let refreshed: RefreshResponse = serde_json::from_slice(&response.bytes().await?)?;

        self.token = Some(refreshed.access_token);
        self.expiry = refreshed
            .expires_in
            .map(|secs| now + TimeDelta::seconds(secs));
        Ok(())
    }
}

/// Resolves an access token from an explicit override or the token file.
///
/// # Errors
///
/// Returns [`Error::Auth`] if no usable token can be obtained.
pub async fn resolve_access_token(
    http: &reqwest::Client,
    config: &AuthConfig,
    override_token: Option<String>,
) -> Result<String> {
    if let Some(token) = override_token.filter(|t| !t.is_empty()) {
        log::debug!("Using access token from {TOKEN_ENV}");
        return Ok(token);
    }

    let path = &config.token_path;
    if !path.exists() {
        return Err(Error::Auth(format!(
            "no credentials: set {TOKEN_ENV} or provide an authorized-user token file at {}",
            path.display()
        )));
    }

    let mut user = AuthorizedUser::load(path)?;
    let now = Utc::now();
    if let Some(token) = user.valid_token(now) {
        return Ok(token.to_string());
    }

    user.refresh(http, now).await?;
    user.save(path)?;
    log::info!("Saved refreshed token to {}", path.display());
    user.token
        .ok_or_else(|| Error::Auth("token endpoint returned no access token".into()))
}

/// Resolves an access token, preferring [`TOKEN_ENV`].
///
/// # Errors
///
/// Returns [`Error::Auth`] if no usable token can be obtained.
pub async fn access_token(http: &reqwest::Client, config: &AuthConfig) -> Result<String> {
    resolve_access_token(http, config, std::env::var(TOKEN_ENV).ok()).await
}
