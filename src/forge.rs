//! HTTP plumbing shared by the release publisher and the asset uploader.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::contract::Credential;
use crate::error::ReleaseError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
pub const API_VERSION: &str = "2022-11-28";
pub const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Builds the client both halves of a run share. Every request gets a
/// user agent and the forge's vendor `Accept` type; authorization is added per
/// request since the credential is passed per call.
///
/// `timeout` bounds connecting and each individual read, not the whole
/// request, so a large asset on a slow link is not cut off while it is still
/// making progress.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ReleaseError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(concat!("github-release/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(ReleaseError::Client)
}

/// `Authorization` header value for a credential, marked sensitive so it is
/// kept out of reqwest's own debug output.
pub fn authorization(credential: &Credential) -> Result<HeaderValue, ReleaseError> {
    let mut value = HeaderValue::from_str(&credential.bearer()).map_err(|_| {
        ReleaseError::InvalidArgument("credential contains characters not allowed in a header".into())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Error payload the forge returns on 4xx responses.
#[derive(Debug, Deserialize)]
pub struct ForgeErrorBody {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

/// Human-readable summary of a forge error body, e.g.
/// `Validation Failed: target_commitish invalid`.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ForgeErrorBody = serde_json::from_str(body).ok()?;
    let details: Vec<String> = parsed
        .errors
        .iter()
        .filter_map(|e| {
            let field = e.get("field").and_then(|v| v.as_str());
            let code = e.get("code").and_then(|v| v.as_str());
            let message = e.get("message").and_then(|v| v.as_str());
            match (field, code, message) {
                (_, _, Some(m)) => Some(m.to_string()),
                (Some(f), Some(c), None) => Some(format!("{f} {c}")),
                (None, Some(c), None) => Some(c.to_string()),
                _ => None,
            }
        })
        .collect();
    if details.is_empty() {
        Some(parsed.message)
    } else {
        Some(format!("{}: {}", parsed.message, details.join(", ")))
    }
}

static HTML_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""html_url"\s*:\s*"([^"]+)""#).ok());

/// Pulls the release's `html_url` out of a body that failed to decode as a
/// whole (truncated or partially unexpected JSON).
pub fn recover_html_url(body: &str) -> Option<String> {
    HTML_URL
        .as_ref()?
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
