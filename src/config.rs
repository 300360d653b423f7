//! Run settings resolved from CLI flags, the optional YAML file and the
//! environment, in that order of precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracing::{debug, info};

use crate::contract::{Credential, MakeLatest, ReleaseRequest};
use crate::discover::{DEFAULT_ASSET_DIR, DEFAULT_PATTERN};
use crate::error::ReleaseError;
use crate::forge::DEFAULT_API_URL;
use crate::load_config::FileConfig;
use crate::mime::MimeTable;
use crate::publish::RepoTarget;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
pub const API_URL_ENV: &str = "GITHUB_API_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Flags that override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Repository owner (user or organisation)
    #[arg(long)]
    pub owner: Option<String>,
    /// Repository name
    #[arg(long)]
    pub repo: Option<String>,
    /// Tag to release; created at --target if it does not exist yet
    #[arg(long)]
    pub tag: Option<String>,
    /// Branch, tag or SHA the tag should point at when it is created
    #[arg(long)]
    pub target: Option<String>,
    /// Release title
    #[arg(long)]
    pub name: Option<String>,
    /// Release notes
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,
    /// Read release notes from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
    /// Create the release as a draft
    #[arg(long)]
    pub draft: bool,
    /// Mark the release as a prerelease
    #[arg(long)]
    pub prerelease: bool,
    /// Let the forge generate release notes
    #[arg(long)]
    pub generate_notes: bool,
    /// Whether the release becomes the repository's latest release
    #[arg(long, value_enum)]
    pub make_latest: Option<MakeLatest>,
    /// Directory to search for assets
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Glob pattern, relative to --dir, selecting the assets
    #[arg(long)]
    pub pattern: Option<String>,
    /// Create the release without uploading any assets
    #[arg(long)]
    pub no_assets: bool,
    /// Forge API base URL
    #[arg(long)]
    pub api_url: Option<String>,
    /// Seconds a connect or a single read may stall before the request fails
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub dir: PathBuf,
    pub pattern: String,
}

#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub target: RepoTarget,
    pub release: ReleaseRequest,
    /// `None` when asset upload is disabled.
    pub assets: Option<AssetSource>,
    pub api_url: String,
    pub timeout: Duration,
    pub mime_types: MimeTable,
}

impl PublishConfig {
    /// Merges flags over the file config, falling back to the environment
    /// (`GITHUB_REPOSITORY`, `GITHUB_API_URL`) and defaults.
    pub fn resolve(overrides: &Overrides, file: FileConfig) -> Result<Self, ReleaseError> {
        let (env_owner, env_repo) = repository_from_env();

        let owner = non_empty(overrides.owner.clone())
            .or_else(|| non_empty(file.owner.clone()))
            .or(env_owner)
            .ok_or(ReleaseError::MissingOwner)?;
        let repo = non_empty(overrides.repo.clone())
            .or_else(|| non_empty(file.repo.clone()))
            .or(env_repo)
            .ok_or(ReleaseError::MissingRepo)?;

        let section = file.release;
        let tag_name = non_empty(overrides.tag.clone())
            .or_else(|| non_empty(section.tag_name.clone()))
            .ok_or(ReleaseError::MissingTagName)?;

        let body = match (&overrides.body, &overrides.body_file) {
            (Some(body), _) => body.clone(),
            (None, Some(path)) => read_body(path)?,
            (None, None) => match (&section.body, &section.body_file) {
                (Some(body), _) => body.clone(),
                (None, Some(path)) => read_body(path)?,
                (None, None) => String::new(),
            },
        };

        let make_latest = match overrides.make_latest {
            Some(value) => Some(value),
            None => section
                .make_latest
                .as_ref()
                .map(|m| m.to_make_latest())
                .transpose()
                .map_err(|e| ReleaseError::Config(e.to_string()))?,
        };

        let release = ReleaseRequest {
            tag_name,
            target_commitish: overrides
                .target
                .clone()
                .or(section.target_commitish)
                .unwrap_or_default(),
            name: overrides.name.clone().or(section.name).unwrap_or_default(),
            body,
            draft: overrides.draft || section.draft,
            prerelease: overrides.prerelease || section.prerelease,
            generate_release_notes: overrides.generate_notes || section.generate_release_notes,
            make_latest,
        };

        let assets = if overrides.no_assets {
            None
        } else {
            let file_assets = file.assets.unwrap_or_default();
            Some(AssetSource {
                dir: overrides
                    .dir
                    .clone()
                    .or(file_assets.dir)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR)),
                pattern: overrides
                    .pattern
                    .clone()
                    .or(file_assets.pattern)
                    .unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
            })
        };

        let api_url = non_empty(overrides.api_url.clone())
            .or_else(|| non_empty(file.api_url.clone()))
            .or_else(|| non_empty(std::env::var(API_URL_ENV).ok()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ReleaseError::Config("timeout must be at least one second".into()));
        }

        let mut mime_types = MimeTable::standard();
        mime_types.extend(&file.mime_types)?;

        Ok(PublishConfig {
            target: RepoTarget { owner, repo },
            release,
            assets,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            mime_types,
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            owner = %self.target.owner,
            repo = %self.target.repo,
            tag = %self.release.tag_name,
            target_commitish = %self.release.target_commitish,
            draft = self.release.draft,
            prerelease = self.release.prerelease,
            api_url = %self.api_url,
            timeout_secs = self.timeout.as_secs(),
            "Loaded publish config"
        );
        match &self.assets {
            Some(assets) => info!(
                dir = %assets.dir.display(),
                pattern = %assets.pattern,
                "Assets will be discovered"
            ),
            None => info!("Asset upload disabled"),
        }
        debug!(mime_types = self.mime_types.len(), "MIME table built");
    }
}

/// Reads the bearer token from `GITHUB_TOKEN`.
pub fn credential_from_env() -> Result<Credential, ReleaseError> {
    match std::env::var(TOKEN_ENV).ok().and_then(Credential::new) {
        Some(credential) => {
            info!(token_set = true, "Credential loaded from environment");
            Ok(credential)
        }
        None => Err(ReleaseError::MissingToken {
            var: TOKEN_ENV.to_string(),
        }),
    }
}

/// `GITHUB_REPOSITORY=owner/repo`, as set by CI runners.
fn repository_from_env() -> (Option<String>, Option<String>) {
    let Some(value) = non_empty(std::env::var(REPOSITORY_ENV).ok()) else {
        return (None, None);
    };
    match value.split_once('/') {
        Some((owner, repo)) => (
            non_empty(Some(owner.to_string())),
            non_empty(Some(repo.to_string())),
        ),
        None => (Some(value), None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_body(path: &Path) -> Result<String, ReleaseError> {
    std::fs::read_to_string(path).map_err(|e| {
        ReleaseError::Config(format!("Failed to read release body from {}: {e}", path.display()))
    })
}
