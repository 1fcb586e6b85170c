//! Rule-based field extractors for identity cards and vehicle plates.

pub mod correction;
pub mod national_id;
pub mod patterns;
pub mod phone;
pub mod script;
pub mod vehicle;

pub use correction::{correct_digits, fold_native_digits, repair_vin};
pub use national_id::{
    decode_national_id, extract_national_id, DecodedNationalId, NationalIdDecoder,
    NationalIdExtractor, NationalIdStrategy,
};
pub use phone::PhoneExtractor;
pub use script::{select_address, select_name, NativeLine, ScriptLines, GOVERNORATES};
pub use vehicle::{VehiclePattern, VehiclePatternSet};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A field candidate with the confidence of the strategy that found it.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            source: source.into(),
        }
    }
}
