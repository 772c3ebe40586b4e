//! Similarity search request construction and submission
//!
//! Request construction is a pure step producing a `SearchRequest` value so
//! the outbound field set can be asserted without I/O; `SearchClient` turns
//! it into a multipart POST. The response body is returned as raw JSON for
//! the shape-tolerant normalizer in `models::results`.

use crate::models::{ActiveFilters, Feature, NormalizedWeights, SubjectImage};
use artfind_common::Credential;
use bytes::Bytes;
use reqwest::multipart;
use std::time::Duration;
use thiserror::Error;

const SEARCH_PATH: &str = "/search";
const USER_AGENT: &str = "artfind/0.1.0 (https://github.com/artfind/artfind)";

/// Search client errors
#[derive(Debug, Error)]
pub enum SearchError {
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

/// An assembled outbound search payload
///
/// Text fields in transmission order: the four boolean active flags, the
/// four weight fractions, then `selected_color` when a color is chosen.
/// Weight fields are never omitted; inactive features carry their flag and
/// a 0.0 fraction.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
    pub fields: Vec<(&'static str, String)>,
}

impl SearchRequest {
    /// Assemble the payload from the session's current selections
    pub fn build(
        subject: &SubjectImage,
        selected_color: Option<&str>,
        weights: &NormalizedWeights,
        filters: &ActiveFilters,
    ) -> Self {
        let mut fields: Vec<(&'static str, String)> = Vec::with_capacity(9);

        for feature in Feature::ALL {
            fields.push((feature.wire_name(), filters.enabled(feature).to_string()));
        }
        for feature in Feature::ALL {
            fields.push((feature.weight_field(), weights.get(feature).to_string()));
        }
        if let Some(color) = selected_color {
            fields.push(("selected_color", color.to_string()));
        }

        Self {
            file_name: subject.file_name.clone(),
            content_type: subject.content_type.clone(),
            data: subject.data.clone(),
            fields,
        }
    }

    /// Value of one text field, for callers inspecting the payload
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn into_form(self) -> Result<multipart::Form, SearchError> {
        let part = multipart::Part::bytes(self.data.to_vec())
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let mut form = multipart::Form::new().part("file", part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Similarity search API client
pub struct SearchClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SearchClient {
    /// Create a new search client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Submit a search and return the raw response body
    ///
    /// The body is deliberately untyped: the backend's response shape is
    /// inconsistent across deployments and is folded into a uniform result
    /// sequence by `normalize_results`. Never retried.
    pub async fn submit(
        &self,
        credential: &Credential,
        request: SearchRequest,
    ) -> Result<serde_json::Value, SearchError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);

        tracing::debug!(
            file = %request.file_name,
            url = %url,
            field_count = request.fields.len(),
            "Submitting similarity search"
        );

        let file_name = request.file_name.clone();
        let form = request.into_form()?;

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(SearchError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(status.as_u16(), error_text));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        tracing::info!(file = %file_name, "Search submission successful");

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureWeights;

    fn subject() -> SubjectImage {
        SubjectImage {
            file_name: "query.png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = SearchClient::new("http://127.0.0.1:8000");
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_carries_all_flags_and_weights() {
        let weights = FeatureWeights::default().normalize(&ActiveFilters::default());
        let request = SearchRequest::build(&subject(), None, &weights, &ActiveFilters::default());

        for feature in Feature::ALL {
            assert_eq!(request.field(feature.wire_name()), Some("true"));
            assert_eq!(request.field(feature.weight_field()), Some("0.25"));
        }
        assert!(request.field("selected_color").is_none());
        assert_eq!(request.fields.len(), 8);
    }

    #[test]
    fn test_build_keeps_inactive_weight_fields() {
        let mut filters = ActiveFilters::default();
        filters.set(Feature::Texture, false);
        filters.set(Feature::Emotion, false);

        let weights = FeatureWeights::default().normalize(&filters);
        let request = SearchRequest::build(&subject(), None, &weights, &filters);

        // Inactivity travels as the boolean flag, never as field absence
        assert_eq!(request.field("texture"), Some("false"));
        assert_eq!(request.field("texture_weight"), Some("0"));
        assert_eq!(request.field("style"), Some("true"));
        assert_eq!(request.field("style_weight"), Some("0.5"));
    }

    #[test]
    fn test_build_includes_selected_color_only_when_set() {
        let weights = FeatureWeights::default().normalize(&ActiveFilters::default());

        let with_color = SearchRequest::build(
            &subject(),
            Some("#ff0000"),
            &weights,
            &ActiveFilters::default(),
        );
        assert_eq!(with_color.field("selected_color"), Some("#ff0000"));
        assert_eq!(with_color.fields.len(), 9);

        let without = SearchRequest::build(&subject(), None, &weights, &ActiveFilters::default());
        assert!(without.field("selected_color").is_none());
    }

    #[test]
    fn test_build_transmits_fractions_not_percentages() {
        let mut raw = FeatureWeights::default();
        for feature in Feature::ALL {
            raw.set(feature, 0.0);
        }
        raw.set(Feature::Style, 40.0);
        raw.set(Feature::Color, 60.0);

        let weights = raw.normalize(&ActiveFilters::default());
        let request = SearchRequest::build(&subject(), None, &weights, &ActiveFilters::default());

        assert_eq!(request.field("style_weight"), Some("0.4"));
        assert_eq!(request.field("color_weight"), Some("0.6"));
        assert_eq!(request.field("texture_weight"), Some("0"));
    }
}
