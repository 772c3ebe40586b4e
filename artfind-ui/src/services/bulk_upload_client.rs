//! Bulk upload client
//!
//! Sends a batch of images to the backend library in one multipart request
//! with repeated `files` parts. The backend response is consumed only as an
//! opaque pass/fail signal per file; there is no per-file progress protocol
//! and no retry.

use crate::models::SubjectImage;
use artfind_common::Credential;
use reqwest::multipart;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const BULK_UPLOAD_PATH: &str = "/upload/bulk";
const USER_AGENT: &str = "artfind/0.1.0 (https://github.com/artfind/artfind)";

/// Bulk upload client errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Credential rejected by the backend
    #[error("Credential rejected by backend")]
    Unauthorized,

    /// Backend returned an error response
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// A file could not be encoded into the request
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Pass/fail outcome for one uploaded file
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub ok: bool,
}

/// Bulk upload API client
pub struct BulkUploadClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BulkUploadClient {
    /// Create a new bulk upload client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Upload a batch of files in a single request
    ///
    /// A 2xx response marks every file as uploaded; any other outcome is an
    /// error the caller fans out as uniform per-file failure.
    pub async fn upload_all(
        &self,
        credential: &Credential,
        files: &[SubjectImage],
    ) -> Result<Vec<UploadOutcome>, UploadError> {
        let url = format!("{}{}", self.base_url, BULK_UPLOAD_PATH);

        tracing::debug!(url = %url, file_count = files.len(), "Submitting bulk upload");

        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| UploadError::EncodingError(e.to_string()))?;
            form = form.part("files", part);
        }

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(UploadError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UploadError::ApiError(status.as_u16(), error_text));
        }

        tracing::info!(file_count = files.len(), "Bulk upload successful");

        Ok(files
            .iter()
            .map(|file| UploadOutcome {
                file_name: file.file_name.clone(),
                ok: true,
            })
            .collect())
    }
}
