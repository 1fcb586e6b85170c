//! End-to-end document scanning: preprocess, recognize, parse, assemble.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::assembler::ResultAssembler;
use crate::error::{RecognitionError, ScanError};
use crate::extract::rules::VehiclePatternSet;
use crate::extract::{IdentityCardParser, VehicleCodeParser};
use crate::models::config::ScanConfig;
use crate::models::document::{DocumentType, ExtractionResult};
use crate::ocr::{
    ImagePreprocessor, PreprocessedImage, RawImage, RecognitionDispatcher, Recognizer,
    RemoteRecognizer,
};

/// Text recognized for one image, with the backend that produced it.
struct Recognized {
    text: String,
    backend: String,
}

/// The document scanner.
///
/// Every public entry point returns an [`ExtractionResult`]; errors are
/// folded into it by the [`ResultAssembler`].
pub struct DocumentScanner {
    preprocessor: ImagePreprocessor,
    dispatcher: RecognitionDispatcher,
    identity_parser: IdentityCardParser,
    vehicle_patterns: VehiclePatternSet,
    assembler: ResultAssembler,
    deadline: Duration,
}

/// Builder for [`DocumentScanner`].
pub struct DocumentScannerBuilder {
    config: ScanConfig,
    backends: Vec<Arc<dyn Recognizer>>,
    vehicle_patterns: VehiclePatternSet,
}

impl DocumentScannerBuilder {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
            backends: Vec::new(),
            vehicle_patterns: VehiclePatternSet::default(),
        }
    }

    /// Use this configuration for preprocessing, deadline, and extraction.
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a recognition backend.
    pub fn with_backend(mut self, backend: impl Recognizer + 'static) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Add an already shared recognition backend.
    pub fn with_shared_backend(mut self, backend: Arc<dyn Recognizer>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Replace the vehicle pattern table.
    pub fn with_vehicle_patterns(mut self, patterns: VehiclePatternSet) -> Self {
        self.vehicle_patterns = patterns;
        self
    }

    pub fn build(self) -> DocumentScanner {
        let deadline = self.config.recognition.deadline();
        let dispatcher = self
            .backends
            .into_iter()
            .fold(
                RecognitionDispatcher::builder().with_deadline(deadline),
                |builder, backend| builder.with_shared_backend(backend),
            )
            .build();

        DocumentScanner {
            preprocessor: ImagePreprocessor::from_config(&self.config.preprocess),
            dispatcher,
            identity_parser: IdentityCardParser::from_config(&self.config.extraction),
            vehicle_patterns: self.vehicle_patterns,
            assembler: ResultAssembler::from_config(&self.config.extraction),
            deadline,
        }
    }
}

impl Default for DocumentScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentScanner {
    pub fn builder() -> DocumentScannerBuilder {
        DocumentScannerBuilder::new()
    }

    /// Build a scanner with the backends enabled in `config`.
    ///
    /// A backend that cannot be constructed is skipped with a warning; it is
    /// an error only if none remains.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let mut builder = Self::builder().with_config(config.clone());
        let mut available = 0;

        if config.recognition.remote.enabled {
            match RemoteRecognizer::from_config(&config.recognition.remote) {
                Ok(remote) => {
                    builder = builder.with_backend(remote);
                    available += 1;
                }
                Err(e) => warn!("Remote recognizer disabled: {}", e),
            }
        }

        #[cfg(feature = "native")]
        {
            if config.recognition.local.enabled {
                match crate::ocr::PureOcrRecognizer::from_config(&config.recognition.local) {
                    Ok(local) => {
                        builder = builder.with_backend(local);
                        available += 1;
                    }
                    Err(e) => warn!("Local recognizer disabled: {}", e),
                }
            }
        }

        if available == 0 {
            return Err(ScanError::Config(
                "no recognition backend available; configure an API key or local models"
                    .to_string(),
            ));
        }

        Ok(builder.build())
    }

    /// Names of the configured recognition backends.
    pub fn backend_names(&self) -> Vec<&str> {
        self.dispatcher.backend_names()
    }

    /// Scan an image of the given document type.
    pub async fn extract(&self, image: RawImage, doc_type: DocumentType) -> ExtractionResult {
        let start = Instant::now();
        info!("Scanning {} ({} bytes, {})", doc_type, image.bytes().len(), image.mime());

        let recognized = match tokio::time::timeout(self.deadline, self.recognize(image)).await {
            Ok(recognized) => recognized,
            Err(_) => Err(ScanError::Timeout(self.deadline)),
        };

        let mut result = match recognized {
            Ok(recognized) => {
                let mut result = self.parse_text(&recognized.text, doc_type);
                result.recognizer = Some(recognized.backend);
                result
            }
            Err(e) => self.assembler.failure(&e),
        };

        finish(&mut result, start);
        result
    }

    /// Scan an image supplied as a `data:image/...;base64,` URI.
    ///
    /// Time spent decoding the URI counts toward `processing_time_ms`.
    pub async fn extract_data_uri(&self, uri: &str, doc_type: DocumentType) -> ExtractionResult {
        let start = Instant::now();
        let image = match RawImage::from_data_uri(uri) {
            Ok(image) => image,
            Err(e) => {
                let mut result = self.assembler.failure(&ScanError::from(e));
                finish(&mut result, start);
                return result;
            }
        };

        let mut result = self.extract(image, doc_type).await;
        finish(&mut result, start);
        result
    }

    /// Run field extraction on already recognized text.
    pub fn extract_from_text(&self, text: &str, doc_type: DocumentType) -> ExtractionResult {
        let start = Instant::now();
        let mut result = self.parse_text(text, doc_type);
        finish(&mut result, start);
        result
    }

    async fn recognize(&self, image: RawImage) -> Result<Recognized, ScanError> {
        let preprocessed = self.preprocess(image).await?;

        let result = self.dispatcher.dispatch(&preprocessed).await.map_err(|e| match e {
            RecognitionError::Timeout(deadline) => ScanError::Timeout(deadline),
            other => ScanError::Recognition(other),
        })?;

        if !result.success {
            let error = result
                .error
                .unwrap_or_else(|| "recognition failed".to_string());
            return Err(ScanError::Recognition(RecognitionError::Backend(format!(
                "{}: {}",
                result.backend, error
            ))));
        }

        if result.text.trim().is_empty() {
            return Err(ScanError::NoTextFound);
        }

        Ok(Recognized {
            text: result.text,
            backend: result.backend,
        })
    }

    async fn preprocess(&self, image: RawImage) -> Result<PreprocessedImage, ScanError> {
        let preprocessor = self.preprocessor.clone();
        let preprocessed = tokio::task::spawn_blocking(move || preprocessor.preprocess(&image))
            .await
            .map_err(|e| ScanError::Config(format!("preprocessing task failed: {}", e)))??;
        Ok(preprocessed)
    }

    fn parse_text(&self, text: &str, doc_type: DocumentType) -> ExtractionResult {
        if text.trim().is_empty() {
            return self.assembler.failure(&ScanError::NoTextFound);
        }

        match VehicleCodeParser::new(doc_type) {
            Some(parser) => {
                let parser = parser.with_patterns(self.vehicle_patterns.clone());
                self.assembler.assemble_vehicle(doc_type, parser.parse(text))
            }
            None => self
                .assembler
                .assemble_identity(self.identity_parser.parse(text)),
        }
    }
}

fn finish(result: &mut ExtractionResult, start: Instant) {
    result.processing_time_ms = start.elapsed().as_millis() as u64;
    info!(
        "Scan finished: success={} confidence={} in {}ms",
        result.success, result.confidence, result.processing_time_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::document::{Gender, UNKNOWN_MARKER};
    use async_trait::async_trait;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const CARD: &str = "جمهورية مصر العربية\n\
        محمد احمد عبد الله\n\
        شارع النيل - الجيزة\n\
        29503150123456";

    struct Fixed {
        name: &'static str,
        delay: Duration,
        outcome: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl Recognizer for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn recognize(&self, _image: PreprocessedImage) -> Result<String, RecognitionError> {
            tokio::time::sleep(self.delay).await;
            match self.outcome {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(RecognitionError::Backend(e.to_string())),
            }
        }
    }

    fn fixed(name: &'static str, millis: u64, outcome: Result<&'static str, &'static str>) -> Fixed {
        Fixed {
            name,
            delay: Duration::from_millis(millis),
            outcome,
        }
    }

    fn photo() -> RawImage {
        let img: RgbImage = ImageBuffer::from_fn(80, 50, |x, y| Rgb([x as u8, y as u8, 200]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        RawImage::new(buf.into_inner(), "image/png").unwrap()
    }

    #[tokio::test]
    async fn test_extract_identity_card() {
        let scanner = DocumentScanner::builder()
            .with_backend(fixed("mock", 10, Ok(CARD)))
            .build();

        let result = scanner.extract(photo(), DocumentType::IdentityCard).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.recognizer.as_deref(), Some("mock"));
        assert_eq!(result.confidence, 90);

        let fields = result.fields.unwrap();
        let fields = fields.as_identity_card().unwrap();
        assert_eq!(fields.name, "محمد احمد عبد الله");
        assert_eq!(fields.national_id, "29503150123456");
        assert_eq!(fields.address, "شارع النيل - الجيزة");
        assert_eq!(fields.birth_date.as_deref(), Some("15/03/1995"));
        assert_eq!(fields.gender, Some(Gender::Male));
    }

    #[tokio::test]
    async fn test_all_backends_fail() {
        let scanner = DocumentScanner::builder()
            .with_backend(fixed("remote", 10, Err("quota exceeded")))
            .with_backend(fixed("local", 20, Err("model crashed")))
            .build();

        let result = scanner.extract(photo(), DocumentType::IdentityCard).await;

        assert!(!result.success);
        assert_eq!(result.confidence, 0);
        assert!(result.fields.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailed));
        assert!(result.error.unwrap().contains("model crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_timeout() {
        let scanner = DocumentScanner::builder()
            .with_backend(fixed("remote", 60_000, Ok(CARD)))
            .build();

        let result = scanner.extract(photo(), DocumentType::IdentityCard).await;

        assert!(!result.success);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_blank_text_is_no_text_found() {
        let scanner = DocumentScanner::builder()
            .with_backend(fixed("local", 5, Ok(" \n ")))
            .build();

        let result = scanner.extract(photo(), DocumentType::ChassisNumber).await;
        assert_eq!(result.error_kind, Some(ErrorKind::NoTextFound));
    }

    #[tokio::test]
    async fn test_invalid_image() {
        let scanner = DocumentScanner::builder()
            .with_backend(fixed("local", 5, Ok(CARD)))
            .build();

        let raw = RawImage::new(vec![1, 2, 3, 4], "image/jpeg").unwrap();
        let result = scanner.extract(raw, DocumentType::IdentityCard).await;
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidImage));
        assert_eq!(result.confidence, 0);

        let result = scanner
            .extract_data_uri("data:text/plain;base64,aGVsbG8=", DocumentType::IdentityCard)
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidImage));
    }

    #[tokio::test]
    async fn test_data_uri_is_timed_end_to_end() {
        use base64::Engine;

        let scanner = DocumentScanner::builder()
            .with_backend(fixed("mock", 25, Ok(CARD)))
            .build();

        let payload = base64::engine::general_purpose::STANDARD.encode(photo().bytes());
        let uri = format!("data:image/png;base64,{}", payload);
        let result = scanner.extract_data_uri(&uri, DocumentType::IdentityCard).await;
        assert!(result.success, "{:?}", result.error);
        assert!(result.processing_time_ms >= 25);

        let result = scanner
            .extract_data_uri("data:image/png;base64,!!!", DocumentType::IdentityCard)
            .await;
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidImage));
        assert!(result.processing_time_ms < 25);
    }

    #[tokio::test]
    async fn test_no_backends() {
        let scanner = DocumentScanner::builder().build();
        let result = scanner.extract(photo(), DocumentType::MotorFingerprint).await;
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::RecognitionFailed));
    }

    #[test]
    fn test_single_native_line_is_not_successful() {
        let scanner = DocumentScanner::builder().build();
        let line = "محمد احمد عبد الله سيد";
        assert_eq!(line.chars().count(), 22);

        let result = scanner.extract_from_text(line, DocumentType::IdentityCard);

        assert!(!result.success);
        assert!(result.confidence < 40);
        let fields = result.fields.unwrap();
        let fields = fields.as_identity_card().unwrap();
        assert_eq!(fields.name, line);
        assert_eq!(fields.address, UNKNOWN_MARKER);
        assert_eq!(fields.national_id, "");
    }

    #[test]
    fn test_extract_vehicle_from_text() {
        let scanner = DocumentScanner::builder().build();

        let result = scanner.extract_from_text("VIN: JTDBR32E720123456", DocumentType::ChassisNumber);
        assert!(result.success);
        assert!(result.confidence >= 90);
        assert_eq!(
            result.fields.unwrap().vehicle_code(),
            Some("JTDBR32E720123456")
        );

        let result = scanner.extract_from_text("X-1", DocumentType::MotorFingerprint);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NoFieldsResolved));
    }

    #[test]
    fn test_extract_from_empty_text() {
        let scanner = DocumentScanner::builder().build();
        let result = scanner.extract_from_text("", DocumentType::IdentityCard);
        assert_eq!(result.error_kind, Some(ErrorKind::NoTextFound));
    }

    #[test]
    fn test_from_config_requires_a_backend() {
        let mut config = ScanConfig::default();
        config.recognition.remote.enabled = true;
        config.recognition.remote.api_key = None;
        config.recognition.local.enabled = false;

        let err = DocumentScanner::from_config(&config).err().unwrap();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_from_config_with_remote() {
        let mut config = ScanConfig::default();
        config.recognition.remote.enabled = true;
        config.recognition.remote.api_key = Some("test-key".to_string());
        config.recognition.local.enabled = false;

        let scanner = DocumentScanner::from_config(&config).unwrap();
        assert_eq!(scanner.backend_names(), vec!["remote"]);
    }
}
