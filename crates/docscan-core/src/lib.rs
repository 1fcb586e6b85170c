//! Core library for scanning identity cards and vehicle identifier plates.
//!
//! This crate provides:
//! - Image normalization before recognition
//! - A dispatcher racing a remote recognizer against an on-device one
//! - Rule-based field extraction for national identity cards
//! - Pattern-table extraction of motor fingerprints and chassis numbers
//! - National ID decoding (birth date and sex), confidence scoring, and
//!   result assembly with manual-entry fallback

pub mod assembler;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod scoring;

pub use assembler::ResultAssembler;
pub use error::{ErrorKind, ImageError, RecognitionError, Result, ScanError};
pub use extract::rules::{decode_national_id, DecodedNationalId, NationalIdDecoder};
pub use extract::{IdentityCardParser, VehicleCode, VehicleCodeParser};
pub use models::{
    DocumentType, ExtractedFields, ExtractionResult, Gender, IdentityCardFields, ScanConfig,
    VehicleCodeFields, UNKNOWN_MARKER,
};
#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;
pub use ocr::{
    ImagePreprocessor, PreprocessedImage, RawImage, RecognitionDispatcher, RecognitionResult,
    Recognizer, RemoteRecognizer,
};
pub use pipeline::{DocumentScanner, DocumentScannerBuilder};
pub use scoring::{ConfidenceScorer, IdentityWeights};
