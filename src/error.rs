//! Error taxonomy for a release run and its mapping onto process exit codes.
//!
//! Errors fall into four groups: configuration problems caught before any
//! network call, release-creation failures (fatal for the whole run), per-asset
//! failures (fatal for the remaining batch), and decode failures after the forge
//! already accepted a request.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("missing credential: environment variable {var} is not set")]
    MissingToken { var: String },

    #[error("missing repository owner")]
    MissingOwner,

    #[error("missing repository name")]
    MissingRepo,

    #[error("missing tag name")]
    MissingTagName,

    #[error("asset directory not found: {}", .path.display())]
    AssetDirNotFound { path: PathBuf },

    #[error("invalid file pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("create release request failed: {0}")]
    CreateRequest(#[source] reqwest::Error),

    #[error("create release unexpected status: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    ReleaseRejected {
        status: StatusCode,
        message: Option<String>,
        body: String,
    },

    #[error("release was created but its response could not be decoded{}: {source}", .html_url.as_deref().map(|u| format!(" (release at {u})")).unwrap_or_default())]
    ReleaseDecode {
        #[source]
        source: serde_json::Error,
        html_url: Option<String>,
    },

    #[error("upload template {template:?} has no {{?name,label}} placeholder")]
    InvalidUploadTemplate { template: String },

    #[error("asset read error for {}: {source}", .path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset upload request failed for {}: {source}", .path.display())]
    AssetUpload {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("asset upload rejected for {}: {status}", .path.display())]
    AssetRejected {
        path: PathBuf,
        status: StatusCode,
        body: String,
    },
}

/// Process exit statuses. The numeric values are part of the CLI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitStatus {
    Success = 0,
    Unknown = 1,
    OwnerNotFound = 2,
    RepoNotFound = 3,
    TagNameRequired = 4,
    TokenNotFound = 5,
    AssetDirNotFound = 6,
    CreateRequestError = 7,
    BadPattern = 8,
    AssetReadError = 9,
    AssetUploadError = 10,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl ReleaseError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ReleaseError::MissingToken { .. } => ExitStatus::TokenNotFound,
            ReleaseError::MissingOwner => ExitStatus::OwnerNotFound,
            ReleaseError::MissingRepo => ExitStatus::RepoNotFound,
            ReleaseError::MissingTagName => ExitStatus::TagNameRequired,
            ReleaseError::AssetDirNotFound { .. } => ExitStatus::AssetDirNotFound,
            ReleaseError::BadPattern { .. } => ExitStatus::BadPattern,
            ReleaseError::Config(_) | ReleaseError::InvalidArgument(_) | ReleaseError::Client(_) => {
                ExitStatus::Unknown
            }
            ReleaseError::CreateRequest(_)
            | ReleaseError::ReleaseRejected { .. }
            | ReleaseError::ReleaseDecode { .. } => ExitStatus::CreateRequestError,
            ReleaseError::AssetRead { .. } => ExitStatus::AssetReadError,
            ReleaseError::AssetUpload { .. }
            | ReleaseError::AssetRejected { .. }
            | ReleaseError::InvalidUploadTemplate { .. } => ExitStatus::AssetUploadError,
        }
    }
}
