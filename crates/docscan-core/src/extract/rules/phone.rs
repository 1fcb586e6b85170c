//! Mobile phone number extraction.

use super::patterns::MOBILE_PHONE;
use super::{ExtractionMatch, FieldExtractor};

/// Mobile phone extractor.
///
/// Yields the national 11-digit form (`01` + operator digit + 8 digits) with
/// separators and any country code dropped.
pub struct PhoneExtractor;

impl PhoneExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Strip separators from a matched number.
    pub fn normalize(raw: &str) -> String {
        raw.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

impl Default for PhoneExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PhoneExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for caps in MOBILE_PHONE.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let number = Self::normalize(m.as_str());
                if results.iter().any(|r| r.value == number) {
                    continue;
                }
                results.push(ExtractionMatch::new(number, 0.9, m.as_str()));
            }
        }

        results
    }
}
