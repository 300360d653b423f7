//! High-level pipeline: create the release, then upload the asset snapshot.
//!
//! # Responsibilities
//! - Creates exactly one release; nothing is uploaded unless that succeeds.
//! - Uploads the discovered files one at a time, in the order given.
//! - Stops the batch at the first failed asset (local read error, transport
//!   failure or non-201 answer). Files after it are never attempted.
//! - Leaves the release and already uploaded assets in place on failure.
//! - A 201 whose body does not decode does not stop the batch: the asset is on
//!   the forge, so it is recorded as [`AssetUploadOutcome::Undecodable`].
//!
//! # Error Handling
//! Release-creation failures are returned as `Err`. Once the release exists the
//! result is always a [`PublishReport`]; a halted batch is described by
//! [`PublishReport::halted`].

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::contract::{
    AssetUploadOutcome, AssetUploader, Credential, ReleasePublisher, ReleaseRequest, ReleaseResult,
};
use crate::error::{ExitStatus, ReleaseError};

/// Where the release goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
}

/// An asset the forge accepted.
#[derive(Debug)]
pub struct AssetReport {
    pub path: PathBuf,
    pub outcome: AssetUploadOutcome,
}

/// The asset whose failure stopped the batch.
#[derive(Debug)]
pub struct BatchHalt {
    pub path: PathBuf,
    pub error: ReleaseError,
}

#[derive(Debug)]
pub struct PublishReport {
    pub release: ReleaseResult,
    /// Attempted assets the forge stored, in upload order.
    pub assets: Vec<AssetReport>,
    pub halted: Option<BatchHalt>,
    /// Files never attempted because the batch halted.
    pub skipped: Vec<PathBuf>,
}

impl PublishReport {
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }

    pub fn undecodable_count(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| matches!(a.outcome, AssetUploadOutcome::Undecodable { .. }))
            .count()
    }

    pub fn exit_status(&self) -> ExitStatus {
        match &self.halted {
            Some(halt) => halt.error.exit_status(),
            None => ExitStatus::Success,
        }
    }
}

pub async fn publish<P, U>(
    publisher: &P,
    uploader: &U,
    credential: &Credential,
    target: &RepoTarget,
    request: &ReleaseRequest,
    assets: &[PathBuf],
) -> Result<PublishReport, ReleaseError>
where
    P: ReleasePublisher + ?Sized,
    U: AssetUploader + ?Sized,
{
    let started = Instant::now();
    info!(
        owner = %target.owner,
        repo = %target.repo,
        tag = %request.tag_name,
        assets = assets.len(),
        "[PUBLISH] Starting release run"
    );

    let release = match publisher
        .create_release(credential, &target.owner, &target.repo, request)
        .await
    {
        Ok(release) => release,
        Err(e) => {
            error!(error = %e, "[PUBLISH] Release creation failed, no assets attempted");
            return Err(e);
        }
    };

    let mut report = PublishReport {
        release,
        assets: Vec::new(),
        halted: None,
        skipped: Vec::new(),
    };

    for (index, path) in assets.iter().enumerate() {
        let result = uploader
            .upload(credential, &report.release.upload_url, path)
            .await;

        if matches!(&result, Ok(outcome) if outcome.is_duplicate()) {
            warn!(file = %path.display(), "[PUBLISH] An asset with this name already exists on the release");
        }

        let failure = match result {
            Ok(AssetUploadOutcome::Rejected { status, body }) => Some(ReleaseError::AssetRejected {
                path: path.clone(),
                status,
                body,
            }),
            Ok(outcome) => {
                if let AssetUploadOutcome::Undecodable { error, .. } = &outcome {
                    warn!(file = %path.display(), error = %error, "[PUBLISH] Asset stored but its response was not decodable");
                }
                report.assets.push(AssetReport {
                    path: path.clone(),
                    outcome,
                });
                None
            }
            Err(e) => Some(e),
        };

        if let Some(error) = failure {
            error!(file = %path.display(), error = %error, "[PUBLISH] Asset failed, halting batch");
            report.skipped = assets[index + 1..].to_vec();
            report.halted = Some(BatchHalt {
                path: path.clone(),
                error,
            });
            break;
        }
    }

    info!(
        release_id = report.release.id,
        uploaded = report.assets.len(),
        skipped = report.skipped.len(),
        complete = report.is_complete(),
        duration_ms = started.elapsed().as_millis() as u64,
        "[PUBLISH] operation complete"
    );
    Ok(report)
}
