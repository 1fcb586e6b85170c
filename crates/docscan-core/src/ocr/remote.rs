//! Remote recognizer speaking the OCR.space form API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{RecognitionError, ScanError};
use crate::models::config::RemoteRecognizerConfig;

use super::{PreprocessedImage, Recognizer};

/// Network recognizer posting the image as a base64 data URI.
///
/// Connection failures are retried up to `max_attempts` times; backend
/// errors are returned immediately.
pub struct RemoteRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: String,
    detect_orientation: bool,
    engine: u8,
    max_attempts: u32,
    retry_backoff: Duration,
}

// ── API response types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParseResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

// ── Recognizer implementation ───────────────────────────────────────────────

impl RemoteRecognizer {
    /// Build a recognizer from configuration.
    pub fn from_config(config: &RemoteRecognizerConfig) -> Result<Self, ScanError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ScanError::Config("remote recognizer requires an API key".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            language: config.language.clone(),
            detect_orientation: config.detect_orientation,
            engine: config.engine,
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Replace the HTTP client (e.g. to share a connection pool).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn send_once(&self, data_uri: &str) -> Result<reqwest::Response, reqwest::Error> {
        let form = [
            ("base64Image", data_uri.to_string()),
            ("language", self.language.clone()),
            ("detectOrientation", self.detect_orientation.to_string()),
            ("scale", "true".to_string()),
            ("isOverlayRequired", "false".to_string()),
            ("OCREngine", self.engine.to_string()),
        ];

        self.client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .form(&form)
            .send()
            .await
    }
}

#[async_trait]
impl Recognizer for RemoteRecognizer {
    fn name(&self) -> &str {
        "remote"
    }

    async fn recognize(&self, image: PreprocessedImage) -> Result<String, RecognitionError> {
        let data_uri = image.to_data_uri();
        let mut attempt = 0;

        let resp = loop {
            attempt += 1;
            info!(
                "RemoteRecognizer: posting {} bytes (attempt {}/{})",
                image.bytes.len(),
                attempt,
                self.max_attempts
            );

            match self.send_once(&data_uri).await {
                Ok(resp) => break resp,
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.max_attempts => {
                    warn!("RemoteRecognizer: attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(RecognitionError::Connection(e.to_string())),
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RecognitionError::Backend(format!("HTTP {}: {}", status, text)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RecognitionError::Response(e.to_string()))?;
        debug!(
            "RemoteRecognizer: raw response ({} bytes): {}",
            body.len(),
            body.chars().take(300).collect::<String>()
        );

        parse_response(&body)
    }
}

/// Extract recognized text from a response body.
fn parse_response(body: &str) -> Result<String, RecognitionError> {
    let parsed: ParseResponse =
        serde_json::from_str(body).map_err(|e| RecognitionError::Response(e.to_string()))?;

    if parsed.is_errored_on_processing {
        let message = parsed
            .error_message
            .as_ref()
            .map(error_message_text)
            .unwrap_or_else(|| "processing failed".to_string());
        return Err(RecognitionError::Backend(message));
    }

    Ok(parsed
        .parsed_results
        .iter()
        .map(|r| r.parsed_text.trim_end())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// The API sends `ErrorMessage` either as a string or as an array of strings.
fn error_message_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
