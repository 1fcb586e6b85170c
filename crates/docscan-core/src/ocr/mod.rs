//! Image preprocessing and text recognition.
//!
//! Recognition backends implement [`Recognizer`]; the [`RecognitionDispatcher`]
//! races them and keeps the first usable text.

mod dispatcher;
#[cfg(feature = "native")]
mod pure_engine;
mod preprocessing;
mod remote;

pub use dispatcher::{RecognitionDispatcher, RecognitionDispatcherBuilder};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;
pub use preprocessing::{ImagePreprocessor, PreprocessedImage, RawImage, PREPROCESSED_MIME};
pub use remote::RemoteRecognizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;

/// Verbatim output of one recognition backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Whether the backend produced usable text.
    pub success: bool,

    /// Recognized text (empty on failure).
    pub text: String,

    /// Backend error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Name of the backend that produced this result.
    pub backend: String,
}

impl RecognitionResult {
    pub fn success(backend: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            error: None,
            backend: backend.into(),
        }
    }

    pub fn failure(backend: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: Some(error.into()),
            backend: backend.into(),
        }
    }

    /// Whether the result carries non-whitespace text.
    pub fn is_usable(&self) -> bool {
        self.success && !self.text.trim().is_empty()
    }
}

/// A text-recognition backend.
///
/// Implementations must not touch shared state: the dispatcher may abandon a
/// call at any point after another backend wins.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Backend name used in logs and result provenance.
    fn name(&self) -> &str;

    /// Recognize text in a preprocessed image.
    async fn recognize(&self, image: PreprocessedImage) -> Result<String, RecognitionError>;
}
