//! Races recognition backends and keeps the first usable text.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::RecognitionError;

use super::{PreprocessedImage, RecognitionResult, Recognizer};

/// Default deadline for a whole dispatch.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);

/// Dispatches one image to every configured backend concurrently.
///
/// The first backend returning non-empty text wins. Losing calls are not
/// cancelled; their tasks are detached and their results ignored.
pub struct RecognitionDispatcher {
    backends: Vec<Arc<dyn Recognizer>>,
    deadline: Duration,
}

/// Builder for [`RecognitionDispatcher`].
pub struct RecognitionDispatcherBuilder {
    backends: Vec<Arc<dyn Recognizer>>,
    deadline: Duration,
}

impl RecognitionDispatcherBuilder {
    /// Create a new builder with the default deadline and no backends.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Add a backend to the race.
    pub fn with_backend(mut self, backend: impl Recognizer + 'static) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Add an already shared backend to the race.
    pub fn with_shared_backend(mut self, backend: Arc<dyn Recognizer>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Set the deadline governing the whole dispatch.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn build(self) -> RecognitionDispatcher {
        RecognitionDispatcher {
            backends: self.backends,
            deadline: self.deadline,
        }
    }
}

impl Default for RecognitionDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognitionDispatcher {
    /// Create a new builder.
    pub fn builder() -> RecognitionDispatcherBuilder {
        RecognitionDispatcherBuilder::new()
    }

    /// Names of the configured backends, in registration order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Race all backends on `image`.
    ///
    /// Returns the first usable result. When every backend finishes without
    /// one, returns an empty successful result if any backend answered with
    /// blank text, otherwise the last failure. Fails with
    /// [`RecognitionError::Timeout`] if the deadline elapses first.
    pub async fn dispatch(
        &self,
        image: &PreprocessedImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        if self.backends.is_empty() {
            return Err(RecognitionError::NoBackends);
        }

        let start = Instant::now();
        let deadline = start + self.deadline;

        let mut pending = FuturesUnordered::new();
        for backend in &self.backends {
            let backend = Arc::clone(backend);
            // Each attempt owns its own copy of the image.
            let image = image.clone();
            pending.push(tokio::spawn(async move {
                let name = backend.name().to_string();
                match backend.recognize(image).await {
                    Ok(text) => RecognitionResult::success(name, text),
                    Err(e) => RecognitionResult::failure(name, e.to_string()),
                }
            }));
        }

        debug!("Dispatched image to {} recognizers", pending.len());

        let mut blank: Option<RecognitionResult> = None;
        let mut last_failure: Option<RecognitionResult> = None;

        loop {
            let next = match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(
                        "Recognition deadline of {:?} elapsed with {} attempts outstanding",
                        self.deadline,
                        pending.len()
                    );
                    return Err(RecognitionError::Timeout(self.deadline));
                }
            };

            let result = match next {
                Some(Ok(result)) => result,
                Some(Err(join_error)) => {
                    warn!("Recognizer task aborted: {}", join_error);
                    last_failure = Some(RecognitionResult::failure(
                        "unknown",
                        format!("recognizer task aborted: {}", join_error),
                    ));
                    continue;
                }
                None => break,
            };

            if result.is_usable() {
                info!(
                    "Recognizer '{}' won with {} characters in {}ms",
                    result.backend,
                    result.text.len(),
                    start.elapsed().as_millis()
                );
                // Dropping `pending` detaches the losing tasks.
                return Ok(result);
            }

            if result.success {
                debug!("Recognizer '{}' returned blank text", result.backend);
                blank = Some(result);
            } else {
                warn!(
                    "Recognizer '{}' failed: {}",
                    result.backend,
                    result.error.as_deref().unwrap_or("unknown error")
                );
                last_failure = Some(result);
            }
        }

        Ok(blank
            .or(last_failure)
            .unwrap_or_else(|| RecognitionResult::failure("dispatcher", "no recognizer answered")))
    }
}
