//! Image normalization before recognition.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::ImageError;
use crate::models::config::PreprocessConfig;

/// MIME type of every preprocessed image.
pub const PREPROCESSED_MIME: &str = "image/jpeg";

/// An encoded raster image supplied by the caller.
#[derive(Debug, Clone)]
pub struct RawImage {
    bytes: Vec<u8>,
    mime: String,
}

impl RawImage {
    /// Wrap encoded bytes with their declared MIME type.
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Result<Self, ImageError> {
        let mime = mime.into().trim().to_lowercase();
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if !mime.starts_with("image/") {
            return Err(ImageError::UnsupportedMime(mime));
        }
        Ok(Self { bytes, mime })
    }

    /// Wrap encoded bytes, sniffing the MIME type from magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = image::guess_format(&bytes)
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        Self::new(bytes, format.to_mime_type())
    }

    /// Decode a bare base64 payload with an explicit MIME type.
    pub fn from_base64(payload: &str, mime: impl Into<String>) -> Result<Self, ImageError> {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(ImageError::Empty);
        }
        let bytes = STANDARD.decode(cleaned)?;
        Self::new(bytes, mime)
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::MalformedDataUri("missing data: scheme".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::MalformedDataUri("missing payload separator".to_string()))?;

        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::MalformedDataUri("payload is not base64".to_string()))?;

        Self::from_base64(payload, mime)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// A resized, contrast-adjusted JPEG derived from a [`RawImage`].
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// JPEG-encoded bytes.
    pub bytes: Vec<u8>,
    /// Width after resizing.
    pub width: u32,
    /// Height after resizing.
    pub height: u32,
}

impl PreprocessedImage {
    pub fn mime(&self) -> &'static str {
        PREPROCESSED_MIME
    }

    /// Encode as a base64 data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", PREPROCESSED_MIME, STANDARD.encode(&self.bytes))
    }

    /// Decode back into a raster.
    pub fn decode(&self) -> Result<DynamicImage, ImageError> {
        image::load_from_memory_with_format(&self.bytes, ImageFormat::Jpeg)
            .map_err(|e| ImageError::Decode(e.to_string()))
    }
}

/// Image preprocessor for the recognition pipeline.
///
/// The transform is fixed (not content-adaptive), so identical input always
/// yields identical output.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Maximum length of the long edge.
    max_dimension: u32,
    /// JPEG quality used for re-encoding.
    jpeg_quality: u8,
    /// Contrast adjustment.
    contrast: f32,
    /// Brightness offset.
    brightness: i32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            contrast: config.contrast,
            brightness: config.brightness,
        }
    }

    /// Set maximum image dimension.
    pub fn with_max_dimension(mut self, size: u32) -> Self {
        self.max_dimension = size.max(1);
        self
    }

    /// Set JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Decode, bound, adjust and re-encode an image.
    pub fn preprocess(&self, raw: &RawImage) -> Result<PreprocessedImage, ImageError> {
        let format = image::guess_format(raw.bytes())
            .ok()
            .or_else(|| ImageFormat::from_mime_type(raw.mime()))
            .ok_or_else(|| ImageError::UnsupportedMime(raw.mime().to_string()))?;

        let decoded = image::load_from_memory_with_format(raw.bytes(), format)
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let normalized = self.normalize(&decoded);
        let (width, height) = normalized.dimensions();

        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
        normalized
            .write_with_encoder(encoder)
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        debug!(
            "Preprocessed {} image to {}x{} ({} bytes)",
            raw.mime(),
            width,
            height,
            bytes.len()
        );

        Ok(PreprocessedImage { bytes, width, height })
    }

    /// Resize within bounds and apply the fixed contrast/brightness transform.
    pub fn normalize(&self, image: &DynamicImage) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();
        debug!("Original image size: {}x{}", orig_width, orig_height);

        let (new_width, new_height) =
            self.calculate_resize_dimensions(orig_width, orig_height, self.max_dimension);

        let resized = if (new_width, new_height) == (orig_width, orig_height) {
            image.clone()
        } else {
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        };

        let adjusted = resized.adjust_contrast(self.contrast).brighten(self.brightness);

        // JPEG carries no alpha channel.
        DynamicImage::ImageRgb8(adjusted.to_rgb8())
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32, target_size: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= target_size {
            return (width, height);
        }

        let scale = target_size as f64 / max_dim as f64;
        let new_width = (width as f64 * scale).round() as u32;
        let new_height = (height as f64 * scale).round() as u32;

        (new_width.clamp(1, target_size), new_height.clamp(1, target_size))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}
