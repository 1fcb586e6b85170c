//! Error types for the docscan-core library.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the docscan library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The supplied image is malformed or cannot be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    /// No recognition backend produced text before the deadline.
    #[error("no recognition backend responded within {0:?}")]
    Timeout(Duration),

    /// Recognition succeeded but the text is empty or unusable.
    #[error("no text found in image")]
    NoTextFound,

    /// Text was recognized but no pattern matched anything of value.
    #[error("no fields resolved: {0}")]
    NoFieldsResolved(String),

    /// Fields were resolved but the result does not clear the success threshold.
    #[error("low confidence: {confidence} (threshold {threshold}){}", missing_suffix(.missing))]
    LowConfidence {
        confidence: u8,
        threshold: u8,
        missing: Vec<&'static str>,
    },

    /// Every recognition backend failed.
    #[error("recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn missing_suffix(missing: &[&'static str]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        format!(", missing {}", missing.join(", "))
    }
}

/// Machine-readable classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidImage,
    Timeout,
    NoTextFound,
    NoFieldsResolved,
    LowConfidence,
    RecognitionFailed,
    Internal,
}

impl ErrorKind {
    /// Whether a result with this error still carries fields to prefill
    /// manual entry.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::LowConfidence)
    }
}

impl ScanError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImage(_) => ErrorKind::InvalidImage,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NoTextFound => ErrorKind::NoTextFound,
            Self::NoFieldsResolved(_) => ErrorKind::NoFieldsResolved,
            Self::LowConfidence { .. } => ErrorKind::LowConfidence,
            Self::Recognition(RecognitionError::Timeout(_)) => ErrorKind::Timeout,
            Self::Recognition(_) => ErrorKind::RecognitionFailed,
            Self::Config(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Errors raised while decoding or normalizing the captured image.
#[derive(Error, Debug)]
pub enum ImageError {
    /// No bytes were supplied.
    #[error("image data is empty")]
    Empty,

    /// The declared MIME type is not an image type.
    #[error("unsupported MIME type: {0}")]
    UnsupportedMime(String),

    /// The data URI is malformed.
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),

    /// Base64 payload could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The raster could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The normalized raster could not be re-encoded.
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Errors raised by recognition backends and the dispatcher.
#[derive(Error, Debug, Clone)]
pub enum RecognitionError {
    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend answered with an error status or payload.
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend answered with a payload that could not be understood.
    #[error("unexpected response: {0}")]
    Response(String),

    /// The local engine failed.
    #[error("local engine error: {0}")]
    Engine(String),

    /// No backend is configured.
    #[error("no recognition backend configured")]
    NoBackends,

    /// The dispatcher deadline elapsed.
    #[error("deadline of {0:?} elapsed")]
    Timeout(Duration),
}

/// Result type for the docscan library.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ScanError::NoTextFound.kind(), ErrorKind::NoTextFound);
        assert_eq!(
            ScanError::Timeout(Duration::from_secs(15)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            ScanError::InvalidImage(ImageError::Empty).kind(),
            ErrorKind::InvalidImage
        );
        assert_eq!(
            ScanError::Recognition(RecognitionError::NoBackends).kind(),
            ErrorKind::RecognitionFailed
        );
    }

    #[test]
    fn test_low_confidence_message() {
        let err = ScanError::LowConfidence {
            confidence: 30,
            threshold: 40,
            missing: vec!["nationalId"],
        };
        assert!(err.kind().is_soft());
        assert_eq!(
            err.to_string(),
            "low confidence: 30 (threshold 40), missing nationalId"
        );
    }
}
