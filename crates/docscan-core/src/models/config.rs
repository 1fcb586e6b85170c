//! Configuration structures for the scanning pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the docscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Image normalization before recognition.
    pub preprocess: PreprocessConfig,

    /// Recognition backends and the dispatch deadline.
    pub recognition: RecognitionConfig,

    /// Field extraction and scoring.
    pub extraction: ExtractionConfig,
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Maximum pixel length of the long edge after resizing.
    pub max_dimension: u32,

    /// JPEG quality used when re-encoding (1 - 100).
    pub jpeg_quality: u8,

    /// Contrast adjustment passed to the image crate (positive increases contrast).
    pub contrast: f32,

    /// Brightness offset added to every channel.
    pub brightness: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            jpeg_quality: 85,
            contrast: 20.0,
            brightness: 10,
        }
    }
}

/// Recognition dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Deadline for the whole dispatch, in milliseconds.
    pub deadline_ms: u64,

    /// Remote network recognizer.
    pub remote: RemoteRecognizerConfig,

    /// On-device recognizer.
    pub local: LocalRecognizerConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 15_000,
            remote: RemoteRecognizerConfig::default(),
            local: LocalRecognizerConfig::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Remote (OCR.space-compatible) recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteRecognizerConfig {
    /// Whether the remote backend takes part in the race.
    pub enabled: bool,

    /// Endpoint receiving the form-encoded request.
    pub endpoint: String,

    /// API key sent in the `apikey` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Language hint.
    pub language: String,

    /// Ask the backend to auto-rotate the image.
    pub detect_orientation: bool,

    /// Backend engine selector.
    pub engine: u8,

    /// Timeout of a single HTTP request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Attempts made when the connection itself fails.
    pub max_attempts: u32,

    /// Pause between reconnection attempts, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for RemoteRecognizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.ocr.space/parse/image".to_string(),
            api_key: None,
            language: "ara".to_string(),
            detect_orientation: true,
            engine: 2,
            request_timeout_ms: 12_000,
            max_attempts: 2,
            retry_backoff_ms: 250,
        }
    }
}

/// On-device recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalRecognizerConfig {
    /// Whether the local backend takes part in the race.
    pub enabled: bool,

    /// Directory containing `det.onnx`, `rec.onnx` and `dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for LocalRecognizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum confidence (0 - 100) for a successful result.
    pub min_confidence: u8,

    /// Two-digit birth years above this value belong to the 1900s.
    pub century_pivot: u8,

    /// Sentinel written into unresolved name/address fields.
    pub unknown_marker: String,

    /// Separator used when joining address fragments.
    pub address_separator: String,

    /// Shortest accepted name line, in characters.
    pub name_min_chars: usize,

    /// Longest accepted name line, in characters.
    pub name_max_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 40,
            century_pivot: 30,
            unknown_marker: crate::models::document::UNKNOWN_MARKER.to_string(),
            address_separator: " - ".to_string(),
            name_min_chars: 5,
            name_max_chars: 50,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.preprocess.max_dimension, 1200);
        assert_eq!(config.recognition.deadline(), Duration::from_secs(15));
        assert_eq!(config.extraction.min_confidence, 40);
        assert!(config.recognition.remote.api_key.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "extraction": { "min_confidence": 60 } }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extraction.min_confidence, 60);
        assert_eq!(config.extraction.century_pivot, 30);
        assert_eq!(config.recognition.remote.language, "ara");
    }
}
