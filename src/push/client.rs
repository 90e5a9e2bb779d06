//! Remote contents-API client.
//!
//! One PUT per write: `{base_url}/repos/{user}/{repo}/contents/{path}` with
//! token auth and an API-version accept header, content base64-encoded per
//! the remote contract. Cancellation is cooperative and observed at the
//! network-call boundary.

use crate::error::PushError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// A remote repository destination. The scope key `user/repo` tags the
/// single-flight slot this destination serializes on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub base_url: String,
    pub user: String,
    pub repo: String,
    pub token: String,
}

impl Destination {
    pub fn scope_key(&self) -> String {
        format!("{}/{}", self.user, self.repo)
    }
}

/// The (content, commit message, branch) part of a remote content record.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub content: Bytes,
    pub message: String,
    pub branch: String,
}

#[derive(Debug, Serialize)]
struct ContentBody<'a> {
    content: String,
    message: &'a str,
    branch: &'a str,
}

/// Parsed success body of a contents write.
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub content: Option<ContentInfo>,
    #[serde(default)]
    pub commit: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ContentInfo {
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Clone, Default)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one content record, observing `cancel` at the request boundary.
    ///
    /// Returns [`PushError::Aborted`] when the token fires before the
    /// request settles; the in-flight request future is dropped, so a
    /// would-be transport error from the same write is discarded.
    pub async fn put_content(
        &self,
        dest: &Destination,
        path: &str,
        request: &ContentRequest,
        cancel: &CancellationToken,
    ) -> Result<ContentResponse, PushError> {
        if cancel.is_cancelled() {
            return Err(PushError::Aborted);
        }

        let url = content_url(dest, path);
        let body = ContentBody {
            content: BASE64.encode(&request.content),
            message: &request.message,
            branch: &request.branch,
        };

        debug!(url = %url, branch = %request.branch, "remote contents write");

        let send = self
            .http
            .put(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", dest.token))
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .json(&body)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(PushError::Aborted),
            result = send => result?,
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            // Keep whatever diagnostics the server sent, even when the body
            // is not the structured error shape.
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) if !parsed.message.is_empty() => parsed.message,
                _ if !body.is_empty() => body,
                _ => status
                    .canonical_reason()
                    .unwrap_or("unspecified error")
                    .to_string(),
            };
            return Err(PushError::RemoteRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Write URL for one content record. `#` would otherwise terminate the path
/// as a fragment, so it is percent-escaped.
fn content_url(dest: &Destination, path: &str) -> String {
    format!(
        "{}/repos/{}/{}/contents/{}",
        dest.base_url.trim_end_matches('/'),
        dest.user,
        dest.repo,
        path.replace('#', "%23"),
    )
}
