//! HTTP client for the assessment backend
//!
//! One reused `reqwest::Client` for connection pooling. Non-2xx responses
//! carry a JSON `{"detail": "..."}` body; the detail string is surfaced
//! verbatim as the user-visible error.

use crate::api::types::Assessment;
use crate::{CaresmaError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Analysis can take a while on long transcripts
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct CleanupResponse {
    sessions_closed: u32,
}

/// Typed client for the assessment and avatar endpoints.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CaresmaError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a transcript file for analysis.
    pub async fn analyze_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        session_id: Option<&str>,
    ) -> Result<Assessment> {
        info!("Uploading {} ({} bytes) for analysis", file_name, bytes.len());

        let file_part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/plain")
            .map_err(|e| CaresmaError::ApiError(format!("Invalid MIME type: {}", e)))?;

        let mut form = Form::new().part("file", file_part);
        if let Some(id) = session_id {
            form = form.text("session_id", id.to_string());
        }

        let response = self
            .http
            .post(format!("{}/assessments/analyze-file", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        Self::parse(response, "Failed to analyze transcript").await
    }

    /// Analyze transcript text directly.
    pub async fn analyze_text(
        &self,
        transcript: &str,
        session_id: Option<&str>,
    ) -> Result<Assessment> {
        let mut body = json!({ "transcript": transcript });
        if let Some(id) = session_id {
            body["session_id"] = json!(id);
        }

        let response = self
            .http
            .post(format!("{}/assessments/analyze", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        Self::parse(response, "Failed to analyze transcript").await
    }

    /// Fetch a single assessment by id.
    pub async fn get_assessment(&self, assessment_id: &str) -> Result<Assessment> {
        let response = self
            .http
            .get(format!("{}/assessments/{}", self.base_url, assessment_id))
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        Self::parse(response, "Failed to fetch assessment").await
    }

    /// List all assessments recorded for a session.
    pub async fn session_assessments(&self, session_id: &str) -> Result<Vec<Assessment>> {
        let response = self
            .http
            .get(format!(
                "{}/assessments/session/{}",
                self.base_url, session_id
            ))
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        Self::parse(response, "Failed to fetch assessments").await
    }

    /// Fetch a short-lived avatar session credential. Used once per
    /// avatar session.
    pub async fn avatar_session_token(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/heygen/session-token", self.base_url))
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        let body: TokenResponse = Self::parse(response, "Failed to get avatar token").await?;
        debug!("Got avatar session token");
        Ok(body.token)
    }

    /// Best-effort cleanup of orphaned remote avatar sessions.
    pub async fn cleanup_avatar_sessions(&self) -> Result<u32> {
        let response = self
            .http
            .post(format!("{}/heygen/cleanup-sessions", self.base_url))
            .send()
            .await
            .map_err(|e| CaresmaError::ApiError(e.to_string()))?;

        let body: CleanupResponse = Self::parse(response, "Failed to clean up sessions").await?;
        info!("Closed {} orphaned avatar sessions", body.sessions_closed);
        Ok(body.sessions_closed)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: Response,
        fallback: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or_else(|| fallback.to_string());
            return Err(CaresmaError::ApiError(detail));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CaresmaError::ApiError(format!("Invalid response body: {}", e)))
    }
}
