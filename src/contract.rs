//! # contract: release and asset interfaces
//!
//! This module defines the two traits a release run is built from and the plain
//! data types that flow between them:
//!
//! - [`ReleasePublisher`] creates the release and hands back a [`ReleaseResult`]
//!   carrying the asset [`UploadTemplate`].
//! - [`AssetUploader`] streams one local file to that template per call and
//!   classifies the forge's answer as an [`AssetUploadOutcome`].
//!
//! Both traits are annotated for `mockall` so the orchestration in
//! [`crate::publish`] can be tested without a forge.
//!
//! ## Ordering
//! An upload template only exists once a release does, so no asset can be
//! uploaded before `create_release` has succeeded. The template is only usable
//! with the same [`Credential`] that created the release.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;

/// Hypermedia marker the forge appends to `upload_url`.
pub const UPLOAD_PLACEHOLDER: &str = "{?name,label}";

/// Bearer token for the forge. Shared read-only for the whole run and never
/// printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Which release the forge should mark as latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MakeLatest {
    True,
    False,
    Legacy,
}

/// Release-creation payload. Empty strings and `false` flags are left off the
/// wire so the forge applies its own defaults.
///
/// When `tag_name` does not exist yet and `target_commitish` is set, the forge
/// creates the tag at that commit as a side effect of the release going live
/// (immediately for a published release, on publish for a draft).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_commitish: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub prerelease: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub generate_release_notes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_latest: Option<MakeLatest>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The `upload_url` of a release, e.g.
/// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadTemplate(String);

impl UploadTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces the placeholder with `?name=<percent-encoded file name>`.
    /// Only the first occurrence is substituted; a template without the
    /// placeholder is an error.
    pub fn resolve(&self, file_name: &str) -> Result<String, ReleaseError> {
        if !self.0.contains(UPLOAD_PLACEHOLDER) {
            return Err(ReleaseError::InvalidUploadTemplate {
                template: self.0.clone(),
            });
        }
        let query = format!("?name={}", urlencoding::encode(file_name));
        Ok(self.0.replacen(UPLOAD_PLACEHOLDER, &query, 1))
    }
}

/// A created release as returned by the forge (201).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResult {
    pub id: u64,
    pub html_url: String,
    pub upload_url: UploadTemplate,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

/// An asset as returned by the forge after a successful upload (201).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Result of one upload call that reached the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetUploadOutcome {
    /// 201 with a decodable body.
    Uploaded(UploadedAsset),
    /// 201, but the body did not decode. The asset exists on the forge.
    Undecodable { status: StatusCode, error: String, body: String },
    /// Any other status; `body` is the forge's diagnostic payload.
    Rejected { status: StatusCode, body: String },
}

impl AssetUploadOutcome {
    /// The forge holds the asset (decoded or not).
    pub fn is_stored(&self) -> bool {
        !matches!(self, AssetUploadOutcome::Rejected { .. })
    }

    /// A 422 for an asset name that already exists on the release.
    pub fn is_duplicate(&self) -> bool {
        match self {
            AssetUploadOutcome::Rejected { status, body } => {
                *status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already_exists")
            }
            _ => false,
        }
    }
}

/// Creates releases on a forge.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReleasePublisher: Send + Sync {
    /// Create a release on `owner/repo`. Exactly one attempt is made.
    ///
    /// Precondition: `owner`, `repo` non-empty. Postcondition on success: the
    /// release exists forge-side and, if `request.tag_name` did not exist and
    /// `request.target_commitish` was set, the forge owns creating that tag.
    async fn create_release(
        &self,
        credential: &Credential,
        owner: &str,
        repo: &str,
        request: &ReleaseRequest,
    ) -> Result<ReleaseResult, ReleaseError>;
}

/// Uploads one file as a release asset.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Stream `path` to `template`. Local read failures and transport failures
    /// are errors; anything the forge answered is an [`AssetUploadOutcome`].
    async fn upload(
        &self,
        credential: &Credential,
        template: &UploadTemplate,
        path: &Path,
    ) -> Result<AssetUploadOutcome, ReleaseError>;
}
