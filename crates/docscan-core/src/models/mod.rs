//! Data models for documents, results, and configuration.

pub mod config;
pub mod document;

pub use config::ScanConfig;
pub use document::{
    DocumentType, ExtractedFields, ExtractionResult, Gender, IdentityCardFields,
    VehicleCodeFields, UNKNOWN_MARKER,
};
