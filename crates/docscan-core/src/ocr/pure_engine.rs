//! On-device recognizer backed by `pure-onnx-ocr`.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{RecognitionError, ScanError};
use crate::models::config::LocalRecognizerConfig;

use super::{PreprocessedImage, Recognizer};

/// Detection model file name inside the model directory.
pub const DETECTION_MODEL: &str = "det.onnx";
/// Recognition model file name inside the model directory.
pub const RECOGNITION_MODEL: &str = "rec.onnx";
/// Character dictionary file name inside the model directory.
pub const DICTIONARY: &str = "dict.txt";

/// Local recognizer running detection + recognition in-process.
///
/// Inference is CPU-bound and runs on the blocking pool; an abandoned call
/// keeps running until the engine returns.
pub struct PureOcrRecognizer {
    engine: Arc<Mutex<pure_onnx_ocr::engine::OcrEngine>>,
    keep_unk: bool,
}

/// A recognized line with its top-left corner, used for reading order.
struct Line {
    x: f32,
    y: f32,
    text: String,
}

impl PureOcrRecognizer {
    /// Create a recognizer from model files in a directory.
    pub fn from_dir(model_dir: &Path, keep_unk: bool) -> Result<Self, ScanError> {
        let det_path = model_dir.join(DETECTION_MODEL);
        let rec_path = model_dir.join(RECOGNITION_MODEL);
        let dict_path = model_dir.join(DICTIONARY);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(ScanError::Config(format!(
                    "local model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| ScanError::Config(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            keep_unk,
        })
    }

    pub fn from_config(config: &LocalRecognizerConfig) -> Result<Self, ScanError> {
        Self::from_dir(&config.model_dir, config.keep_unk)
    }
}

#[async_trait]
impl Recognizer for PureOcrRecognizer {
    fn name(&self) -> &str {
        "local"
    }

    async fn recognize(&self, image: PreprocessedImage) -> Result<String, RecognitionError> {
        let engine = Arc::clone(&self.engine);
        let keep_unk = self.keep_unk;

        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let decoded = image
                .decode()
                .map_err(|e| RecognitionError::Engine(e.to_string()))?;

            let engine = engine
                .lock()
                .map_err(|_| RecognitionError::Engine("engine lock poisoned".to_string()))?;
            let results = engine
                .run_from_image(&decoded)
                .map_err(|e| RecognitionError::Engine(format!("pure-onnx-ocr: {}", e)))?;

            debug!("pure-onnx-ocr returned {} text regions", results.len());

            let mut lines: Vec<Line> = results
                .iter()
                .map(|r| {
                    let (x, y) = top_left(&r.bounding_box);
                    let text = if keep_unk {
                        r.text.clone()
                    } else {
                        r.text.replace("[UNK]", " ")
                    };
                    Line { x, y, text }
                })
                .collect();

            sort_by_reading_order(&mut lines);

            let text = lines
                .iter()
                .map(|l| l.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n");

            info!(
                "Local OCR complete: {} lines in {}ms",
                lines.len(),
                start.elapsed().as_millis()
            );

            Ok(text)
        })
        .await
        .map_err(|e| RecognitionError::Engine(format!("local recognizer task failed: {}", e)))?
    }
}

/// Minimum x and y over the polygon's exterior.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}

/// Top-to-bottom in 20px rows; within a row, right-to-left for Arabic cards.
fn sort_by_reading_order(lines: &mut [Line]) {
    lines.sort_by(|a, b| {
        let row_a = (a.y / 20.0) as i32;
        let row_b = (b.y / 20.0) as i32;
        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            b.x.partial_cmp(&a.x).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: f32, y: f32, text: &str) -> Line {
        Line {
            x,
            y,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_reading_order() {
        let mut lines = vec![
            line(10.0, 105.0, "left"),
            line(400.0, 12.0, "top"),
            line(300.0, 101.0, "right"),
        ];
        sort_by_reading_order(&mut lines);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "right", "left"]);
    }

    #[test]
    fn test_missing_models() {
        let err = PureOcrRecognizer::from_dir(Path::new("/nonexistent/models"), false)
            .err()
            .unwrap();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
