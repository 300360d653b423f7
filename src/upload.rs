//! Asset upload: streams one local file to a release's upload endpoint.
//!
//! The file is opened, stat'ed and streamed from disk; it is never buffered whole.
//! `Content-Length` is always set from the stat taken right before the request,
//! because a streamed body has no length the transport could infer.
//!
//! The file handle is owned by the request body and is closed when the call
//! returns, whatever the outcome.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::{Body, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use crate::contract::{AssetUploadOutcome, AssetUploader, Credential, UploadTemplate, UploadedAsset};
use crate::error::ReleaseError;
use crate::forge;
use crate::mime::MimeTable;

pub struct GitHubUploader {
    http: reqwest::Client,
    mime_types: MimeTable,
}

impl GitHubUploader {
    pub fn new(http: reqwest::Client, mime_types: MimeTable) -> Self {
        Self { http, mime_types }
    }

    pub fn content_type(&self, path: &Path) -> &str {
        self.mime_types.resolve(path)
    }
}

#[async_trait]
impl AssetUploader for GitHubUploader {
    async fn upload(
        &self,
        credential: &Credential,
        template: &UploadTemplate,
        path: &Path,
    ) -> Result<AssetUploadOutcome, ReleaseError> {
        let read_err = |source: std::io::Error| ReleaseError::AssetRead {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).await.map_err(read_err)?;
        let metadata = file.metadata().await.map_err(read_err)?;
        if !metadata.is_file() {
            return Err(read_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let content_length = metadata.len();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                read_err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no file name",
                ))
            })?;
        let content_type = self.content_type(path).to_string();
        let url = template.resolve(&file_name)?;

        info!(
            name = %file_name,
            content_type = %content_type,
            content_length,
            "[ASSET] Uploading asset"
        );
        debug!(url = %url, "[ASSET] POST to upload endpoint");

        let content_type_value = HeaderValue::from_str(&content_type).map_err(|_| {
            ReleaseError::InvalidArgument(format!("invalid content type {content_type:?}"))
        })?;

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, forge::authorization(credential)?)
            .header(header::CONTENT_TYPE, content_type_value)
            .header(header::CONTENT_LENGTH, content_length)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|source| {
                error!(error = %source, name = %file_name, "[ASSET] Upload request failed");
                ReleaseError::AssetUpload {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ReleaseError::AssetUpload {
            path: path.to_path_buf(),
            source,
        })?;

        if status != StatusCode::CREATED {
            error!(%status, name = %file_name, body = %body, "[ASSET] Upload asset rejected");
            return Ok(AssetUploadOutcome::Rejected { status, body });
        }

        match serde_json::from_str::<UploadedAsset>(&body) {
            Ok(asset) => {
                debug!(name = %asset.name, id = asset.id, %status, "[ASSET] Uploaded asset");
                Ok(AssetUploadOutcome::Uploaded(asset))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    name = %file_name,
                    "[ASSET] Asset uploaded but response could not be decoded"
                );
                Ok(AssetUploadOutcome::Undecodable {
                    status,
                    error: e.to_string(),
                    body,
                })
            }
        }
    }
}
