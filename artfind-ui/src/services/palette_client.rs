//! Palette extraction client
//!
//! Sends the subject image to the backend's palette endpoint and returns
//! the ordered list of representative colors. Callers degrade a failure to
//! an empty palette; this client only reports it.

use crate::models::SubjectImage;
use artfind_common::Credential;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const PALETTE_PATH: &str = "/palette/extract";
const USER_AGENT: &str = "artfind/0.1.0 (https://github.com/artfind/artfind)";

/// Palette client errors
#[derive(Debug, Error)]
pub enum PaletteError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Credential rejected by the backend
    #[error("Credential rejected by backend")]
    Unauthorized,

    /// Backend returned an error response
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Failed to parse the response JSON
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Palette extraction response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteResponse {
    /// Representative colors, most dominant first
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Palette extraction API client
pub struct PaletteClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PaletteClient {
    /// Create a new palette client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, PaletteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaletteError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Extract the representative palette for a subject image
    ///
    /// Returns the ordered color list, possibly empty. Never retried.
    pub async fn extract(
        &self,
        credential: &Credential,
        subject: &SubjectImage,
    ) -> Result<Vec<String>, PaletteError> {
        let url = format!("{}{}", self.base_url, PALETTE_PATH);

        tracing::debug!(file = %subject.file_name, url = %url, "Requesting palette extraction");

        let part = multipart::Part::bytes(subject.data.to_vec())
            .file_name(subject.file_name.clone())
            .mime_str(&subject.content_type)
            .map_err(|e| PaletteError::ParseError(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await
            .map_err(|e| PaletteError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(PaletteError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PaletteError::ApiError(status.as_u16(), error_text));
        }

        let palette: PaletteResponse = response
            .json()
            .await
            .map_err(|e| PaletteError::ParseError(e.to_string()))?;

        tracing::info!(
            file = %subject.file_name,
            color_count = palette.colors.len(),
            "Palette extraction successful"
        );

        Ok(palette.colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PaletteClient::new("http://127.0.0.1:8000");
        assert!(client.is_ok());
    }

    #[test]
    fn test_palette_response_tolerates_missing_colors() {
        let parsed: PaletteResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.colors.is_empty());

        let parsed: PaletteResponse =
            serde_json::from_str(r##"{"colors":["#ff0000","#00ff00"]}"##).unwrap();
        assert_eq!(parsed.colors, vec!["#ff0000", "#00ff00"]);
    }
}
