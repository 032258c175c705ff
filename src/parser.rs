//! Remote parsing: the [`DocumentParser`] seam and its cloud implementation.
//!
//! The batch loop never talks HTTP directly — it goes through the
//! [`DocumentParser`] trait, so tests can inject a mock via
//! [`crate::config::BatchConfig::parser`] and run the full batch offline.
//! [`LlamaParseClient`] is the production implementation.
//!
//! ## Job lifecycle
//!
//! The service is asynchronous on its side:
//!
//! ```text
//! upload ──▶ poll status ──▶ fetch result
//! (multipart)  (PENDING…)     (pages of markdown)
//! ```
//!
//! 1. `POST /api/v1/parsing/upload` — the file plus the tier's mode flag
//! 2. `GET /api/v1/parsing/job/{id}` — repeated at `poll_interval` until the
//!    job reaches a terminal status or `job_timeout` passes
//! 3. `GET /api/v1/parsing/job/{id}/result/json` — one markdown segment per
//!    parsed page, order preserved
//!
//! There is no retry: a failed upload, poll, or fetch surfaces once as a
//! [`ParseError`] and the file stays failed for the run.

use crate::config::{BatchConfig, ParseTier};
use crate::error::BatchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// One text segment returned by the service (one parsed page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Markdown content of the segment.
    pub text: String,
}

/// Errors from a single parse interaction. Always non-fatal for the batch:
/// [`crate::convert`] folds these into a failed [`crate::output::FileReport`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("Service returned HTTP {status}: {detail}")]
    Service { status: u16, detail: String },

    /// The job reached a terminal state other than success.
    #[error("Parse job {id} ended with status {status}")]
    JobFailed { id: String, status: String },

    /// The job stayed non-terminal past the configured deadline.
    #[error("Parse job {id} still pending after {secs}s")]
    JobTimeout { id: String, secs: u64 },

    /// The input file could not be read for upload.
    #[error("Failed to read '{path}': {detail}")]
    ReadInput { path: PathBuf, detail: String },
}

/// A document-parsing backend.
///
/// `tier` selects between the service's auto and premium configurations;
/// both are the same collaborator, not separate engines. Implementations
/// return the document's text segments in reading order, an empty vector
/// when the service extracted nothing, or an error.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, file: &Path, tier: ParseTier)
        -> Result<Vec<ParsedDocument>, ParseError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobResultResponse {
    #[serde(default)]
    pages: Vec<ResultPage>,
}

#[derive(Debug, Deserialize)]
struct ResultPage {
    #[serde(default)]
    md: String,
}

/// Terminal-state classification for a job status string.
#[derive(Debug, PartialEq, Eq)]
enum JobState {
    Pending,
    Success,
    Failed,
}

fn job_state(status: &str) -> JobState {
    match status {
        "SUCCESS" => JobState::Success,
        "ERROR" | "CANCELED" => JobState::Failed,
        _ => JobState::Pending,
    }
}

/// The multipart form field enabling the requested tier.
fn mode_field(tier: ParseTier) -> (&'static str, &'static str) {
    match tier {
        ParseTier::Auto => ("auto_mode", "true"),
        ParseTier::Premium => ("premium_mode", "true"),
    }
}

// ── Cloud client ─────────────────────────────────────────────────────────

/// Client for the LlamaParse cloud parsing API.
pub struct LlamaParseClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl LlamaParseClient {
    /// Build a client from the run configuration.
    ///
    /// # Errors
    /// [`BatchError::MissingApiKey`] when no credential is configured — this
    /// is the fatal startup check; nothing has touched the filesystem yet.
    pub fn from_config(config: &BatchConfig) -> Result<Self, BatchError> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => {
                return Err(BatchError::MissingApiKey {
                    var: crate::config::API_KEY_ENV.to_string(),
                })
            }
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BatchError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval,
            job_timeout: config.job_timeout,
        })
    }

    async fn upload(&self, file: &Path, tier: ParseTier) -> Result<String, ParseError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ParseError::ReadInput {
                path: file.to_path_buf(),
                detail: e.to_string(),
            })?;

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let (mode, enabled) = mode_field(tier);
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("result_type", "markdown")
            .text(mode, enabled);

        let response = self
            .http
            .post(format!("{}/api/v1/parsing/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = Self::check(response).await?.json().await?;
        debug!("Uploaded {} as job {}", file.display(), upload.id);
        Ok(upload.id)
    }

    async fn wait_for_job(&self, id: &str) -> Result<(), ParseError> {
        let deadline = Instant::now() + self.job_timeout;
        loop {
            let response = self
                .http
                .get(format!("{}/api/v1/parsing/job/{id}", self.base_url))
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let status: JobStatusResponse = Self::check(response).await?.json().await?;

            match job_state(&status.status) {
                JobState::Success => return Ok(()),
                JobState::Failed => {
                    return Err(ParseError::JobFailed {
                        id: id.to_string(),
                        status: status.status,
                    })
                }
                JobState::Pending => {
                    if Instant::now() >= deadline {
                        return Err(ParseError::JobTimeout {
                            id: id.to_string(),
                            secs: self.job_timeout.as_secs(),
                        });
                    }
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn fetch_result(&self, id: &str) -> Result<Vec<ParsedDocument>, ParseError> {
        let response = self
            .http
            .get(format!(
                "{}/api/v1/parsing/job/{id}/result/json",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let result: JobResultResponse = Self::check(response).await?.json().await?;

        Ok(result
            .pages
            .into_iter()
            .map(|page| ParsedDocument { text: page.md })
            .collect())
    }

    /// Map non-2xx responses to [`ParseError::Service`] with a body excerpt.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ParseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // Char-based truncation: the body can be non-ASCII and a byte cut
        // could land mid-codepoint.
        let detail: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        Err(ParseError::Service {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl DocumentParser for LlamaParseClient {
    async fn parse(
        &self,
        file: &Path,
        tier: ParseTier,
    ) -> Result<Vec<ParsedDocument>, ParseError> {
        let id = self.upload(file, tier).await?;
        self.wait_for_job(&id).await?;
        self.fetch_result(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_states_classify_terminal_and_pending() {
        assert_eq!(job_state("SUCCESS"), JobState::Success);
        assert_eq!(job_state("ERROR"), JobState::Failed);
        assert_eq!(job_state("CANCELED"), JobState::Failed);
        assert_eq!(job_state("PENDING"), JobState::Pending);
        assert_eq!(job_state("QUEUED"), JobState::Pending);
    }

    #[test]
    fn tier_maps_to_the_right_mode_flag() {
        assert_eq!(mode_field(ParseTier::Auto), ("auto_mode", "true"));
        assert_eq!(mode_field(ParseTier::Premium), ("premium_mode", "true"));
    }

    #[test]
    fn upload_response_deserialises() {
        let upload: UploadResponse =
            serde_json::from_str(r#"{"id": "job-123", "status": "PENDING"}"#).unwrap();
        assert_eq!(upload.id, "job-123");
    }

    #[test]
    fn result_pages_preserve_order_and_tolerate_missing_fields() {
        let result: JobResultResponse = serde_json::from_str(
            r#"{"pages": [{"md": "Page 1", "page": 1}, {"page": 2}, {"md": "Page 3"}]}"#,
        )
        .unwrap();
        let texts: Vec<_> = result.pages.into_iter().map(|p| p.md).collect();
        assert_eq!(texts, vec!["Page 1", "", "Page 3"]);
    }

    #[test]
    fn empty_result_body_means_no_pages() {
        let result: JobResultResponse = serde_json::from_str("{}").unwrap();
        assert!(result.pages.is_empty());
    }

    #[test]
    fn from_config_requires_a_key() {
        let config = BatchConfig::default();
        assert!(matches!(
            LlamaParseClient::from_config(&config),
            Err(BatchError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn from_config_trims_trailing_slash() {
        let config = BatchConfig::builder()
            .api_key("llx-test")
            .base_url("https://example.test/")
            .build()
            .unwrap();
        let client = LlamaParseClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "https://example.test");
    }
}
