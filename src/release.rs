//! Release creation against the forge's REST API.
//!
//! `POST {api_url}/repos/{owner}/{repo}/releases` with a JSON [`ReleaseRequest`].
//! Only a 201 counts as success. A 201 whose body does not decode is still an
//! error, since the run cannot continue without the upload template, but the
//! release URL is recovered where possible so the operator can find it.

use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, error, info};

use crate::contract::{Credential, ReleasePublisher, ReleaseRequest, ReleaseResult};
use crate::error::ReleaseError;
use crate::forge;

pub struct GitHubPublisher {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubPublisher {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { http, api_url }
    }

    pub fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, owner, repo)
    }
}

#[async_trait]
impl ReleasePublisher for GitHubPublisher {
    async fn create_release(
        &self,
        credential: &Credential,
        owner: &str,
        repo: &str,
        request: &ReleaseRequest,
    ) -> Result<ReleaseResult, ReleaseError> {
        if owner.trim().is_empty() {
            return Err(ReleaseError::InvalidArgument("owner must not be empty".into()));
        }
        if repo.trim().is_empty() {
            return Err(ReleaseError::InvalidArgument("repo must not be empty".into()));
        }

        let url = self.releases_url(owner, repo);
        info!(
            owner,
            repo,
            tag = %request.tag_name,
            draft = request.draft,
            prerelease = request.prerelease,
            "[RELEASE] Creating release"
        );

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, forge::authorization(credential)?)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "[RELEASE] Create release request failed");
                ReleaseError::CreateRequest(e)
            })?;

        let status = response.status();
        debug!(%status, headers = ?response.headers(), "[RELEASE] Create release response");

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            error!(error = %e, %status, "[RELEASE] Failed to read create release response body");
            ReleaseError::CreateRequest(e)
        })?;

        // 422 usually means a bad tag or commit-ish.
        if status != StatusCode::CREATED {
            let message = forge::error_message(&body);
            error!(%status, message = ?message, body = %body, "[RELEASE] Create release rejected");
            return Err(ReleaseError::ReleaseRejected {
                status,
                message,
                body,
            });
        }

        match serde_json::from_str::<ReleaseResult>(&body) {
            Ok(release) => {
                info!(id = release.id, url = %release.html_url, "[RELEASE] Release created");
                Ok(release)
            }
            Err(source) => {
                let html_url = forge::recover_html_url(&body).or(location);
                error!(
                    error = %source,
                    release_url = ?html_url,
                    "[RELEASE] Release created but response could not be decoded"
                );
                Err(ReleaseError::ReleaseDecode { source, html_url })
            }
        }
    }
}
