//! Motor-fingerprint and chassis-number parser.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ScanError;
use crate::models::document::DocumentType;

use super::rules::patterns::VEHICLE_LABEL;
use super::rules::{fold_native_digits, repair_vin, VehiclePattern, VehiclePatternSet};
use super::Result;

/// Length of a standard VIN.
pub const VIN_LEN: usize = 17;

/// Confidence assigned to a fallback code.
pub const FALLBACK_CONFIDENCE: u8 = 50;

/// A parsed vehicle identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCode {
    /// Uppercase alphanumeric code.
    pub code: String,
    /// Name of the winning pattern, `None` for the cleaned-text fallback.
    pub pattern: Option<String>,
    /// Confidence (0-100) of the winning pattern or the fallback.
    pub confidence: u8,
}

impl VehicleCode {
    fn matched(code: &str, pattern: &VehiclePattern) -> Self {
        Self {
            code: code.to_string(),
            pattern: Some(pattern.name.clone()),
            confidence: pattern.confidence,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.pattern.is_none()
    }
}

/// Pattern-table parser for engraved vehicle identifiers.
pub struct VehicleCodeParser {
    doc_type: DocumentType,
    patterns: VehiclePatternSet,
    fallback_confidence: u8,
}

impl VehicleCodeParser {
    /// Create a parser with the built-in pattern table.
    ///
    /// Returns `None` for non-vehicle document types.
    pub fn new(doc_type: DocumentType) -> Option<Self> {
        doc_type.is_vehicle().then(|| Self {
            doc_type,
            patterns: VehiclePatternSet::default(),
            fallback_confidence: FALLBACK_CONFIDENCE,
        })
    }

    /// Replace the pattern table.
    pub fn with_patterns(mut self, patterns: VehiclePatternSet) -> Self {
        self.patterns = patterns;
        self
    }

    /// Set the fallback confidence.
    pub fn with_fallback_confidence(mut self, confidence: u8) -> Self {
        self.fallback_confidence = confidence.min(100);
        self
    }

    pub fn document_type(&self) -> DocumentType {
        self.doc_type
    }

    /// Accepted length of the cleaned-text fallback.
    pub fn fallback_window(&self) -> (usize, usize) {
        match self.doc_type {
            DocumentType::ChassisNumber => (8, 25),
            _ => (6, 25),
        }
    }

    /// Split text into cleaned uppercase alphanumeric tokens.
    ///
    /// Words split on whitespace and label separators (`:`, `#`, `=`); other
    /// punctuation is removed inside a word, so `1P52FMH-1234567` stays one
    /// token. Label words are dropped; for chassis plates a 17-character
    /// token holding `I`, `O` or `Q` is repaired to a valid VIN.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.clean_words(text, |c| c.is_whitespace() || matches!(c, ':' | '#' | '='))
    }

    /// Split text on every non-alphanumeric character.
    ///
    /// Keeps a VIN apart from punctuation-joined neighbours such as a model
    /// year (`.../2019`) or a label (`VIN-...`).
    pub fn fragments(&self, text: &str) -> Vec<String> {
        self.clean_words(text, |c| !c.is_alphanumeric())
    }

    fn clean_words(&self, text: &str, split: impl Fn(char) -> bool) -> Vec<String> {
        fold_native_digits(text)
            .split(split)
            .map(|word| {
                word.chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_uppercase())
                    .collect::<String>()
            })
            .filter(|token| !token.is_empty() && !VEHICLE_LABEL.is_match(token))
            .map(|token| {
                if self.doc_type == DocumentType::ChassisNumber {
                    if let Some(repaired) = repair_vin(&token) {
                        debug!("Repaired VIN candidate {} -> {}", token, repaired);
                        return repaired;
                    }
                }
                token
            })
            .collect()
    }

    /// Parse recognized text into a vehicle code.
    ///
    /// Patterns are tried in priority order; the first pattern with any match
    /// wins and its longest candidate is kept. For chassis plates a
    /// 17-character candidate from any pattern takes precedence; it is
    /// searched in punctuation-split fragments before whole words.
    pub fn parse(&self, text: &str) -> Result<VehicleCode> {
        info!(
            "Parsing {} from {} characters of text",
            self.doc_type,
            text.len()
        );

        let tokens = self.tokenize(text);

        if self.doc_type == DocumentType::ChassisNumber {
            let fragments = self.fragments(text);
            for pattern in self.patterns.for_document(self.doc_type) {
                let vin = fragments
                    .iter()
                    .chain(tokens.iter())
                    .flat_map(|token| pattern.find_in(token))
                    .find(|candidate| candidate.len() == VIN_LEN);
                if let Some(vin) = vin {
                    debug!("17-character candidate via {}", pattern.name);
                    return Ok(VehicleCode::matched(&vin, pattern));
                }
            }
        }

        for pattern in self.patterns.for_document(self.doc_type) {
            let longest = tokens
                .iter()
                .flat_map(|token| pattern.find_in(token))
                .reduce(|best, candidate| {
                    if candidate.len() > best.len() {
                        candidate
                    } else {
                        best
                    }
                });
            if let Some(code) = longest {
                debug!("Matched {} via {}", code, pattern.name);
                return Ok(VehicleCode::matched(&code, pattern));
            }
        }

        let cleaned = tokens.concat();
        let (min, max) = self.fallback_window();
        if (min..=max).contains(&cleaned.len()) {
            debug!("No pattern matched, using cleaned text {}", cleaned);
            return Ok(VehicleCode {
                code: cleaned,
                pattern: None,
                confidence: self.fallback_confidence,
            });
        }

        Err(ScanError::NoFieldsResolved(format!(
            "no {} pattern matched and cleaned text has {} characters (expected {}-{})",
            self.doc_type,
            cleaned.len(),
            min,
            max
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn motor() -> VehicleCodeParser {
        VehicleCodeParser::new(DocumentType::MotorFingerprint).unwrap()
    }

    fn chassis() -> VehicleCodeParser {
        VehicleCodeParser::new(DocumentType::ChassisNumber).unwrap()
    }

    #[test]
    fn test_identity_card_has_no_vehicle_parser() {
        assert!(VehicleCodeParser::new(DocumentType::IdentityCard).is_none());
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            chassis().tokenize("VIN: jtdbr32e7-2012345 ٦"),
            vec!["JTDBR32E72012345", "6"]
        );
        assert_eq!(chassis().tokenize("VIN:JTDBR32E720123456"), vec!["JTDBR32E720123456"]);
    }

    #[test]
    fn test_motor_engine_model() {
        let code = motor().parse("ENGINE NO: 1P52FMH-1234567").unwrap();
        assert_eq!(code.code, "1P52FMH1234567");
        assert_eq!(code.pattern.as_deref(), Some("engine_model_serial"));
        assert_eq!(code.confidence, 95);
    }

    #[test]
    fn test_motor_with_native_label() {
        let code = motor().parse("رقم الموتور\n161FMJ12345678").unwrap();
        assert_eq!(code.code, "161FMJ12345678");
        assert_eq!(code.pattern.as_deref(), Some("displacement_serial"));
    }

    #[test]
    fn test_longest_candidate_within_pattern() {
        let code = motor().parse("AB123456 CD123456789").unwrap();
        assert_eq!(code.code, "CD123456789");
        assert_eq!(code.pattern.as_deref(), Some("letter_prefixed_serial"));
    }

    #[test]
    fn test_chassis_known_wmi() {
        let code = chassis().parse("VIN JTDBR32E720123456").unwrap();
        assert_eq!(code.code, "JTDBR32E720123456");
        assert_eq!(code.pattern.as_deref(), Some("vin_known_wmi"));
        assert_eq!(code.confidence, 98);
    }

    #[test]
    fn test_chassis_repairs_ambiguous_letters() {
        let code = chassis().parse("JTDBR32E72O12345Q").unwrap();
        assert_eq!(code.code, "JTDBR32E720123450");
        assert!(!code.is_fallback());
    }

    #[test]
    fn test_chassis_prefers_seventeen_characters() {
        let patterns = VehiclePatternSet::empty()
            .with_pattern(
                VehiclePattern::new("short", r"[A-Z]{2}\d{6}", 10, 96, &[DocumentType::ChassisNumber])
                    .unwrap(),
            )
            .with_pattern(
                VehiclePattern::new("generic", r"[A-Z0-9]{8,20}", 90, 90, &[DocumentType::ChassisNumber])
                    .unwrap(),
            );
        let code = chassis()
            .with_patterns(patterns)
            .parse("AB123456 XYZ12345678901234")
            .unwrap();
        assert_eq!(code.code, "XYZ12345678901234");
        assert_eq!(code.pattern.as_deref(), Some("generic"));
    }

    #[test]
    fn test_fragments_split_on_punctuation() {
        assert_eq!(
            chassis().fragments("VIN-JTDBR32E720123456/2019"),
            vec!["JTDBR32E720123456", "2019"]
        );
    }

    #[test]
    fn test_chassis_vin_glued_to_punctuation() {
        for text in [
            "JTDBR32E720123456/2019",
            "VIN-JTDBR32E720123456",
            "(JTDBR32E720123456)",
            "CHASSIS#JTDBR32E720123456.",
            "رقم الشاسيه:JTDBR32E720123456-",
        ] {
            let code = chassis().parse(text).unwrap();
            assert_eq!(code.code, "JTDBR32E720123456", "input {text}");
            assert_eq!(code.pattern.as_deref(), Some("vin_known_wmi"));
        }
    }

    #[test]
    fn test_chassis_repairs_vin_glued_to_label() {
        let code = chassis().parse("VIN-JTDBR32E72O12345Q/2019").unwrap();
        assert_eq!(code.code, "JTDBR32E720123450");
    }

    #[test]
    fn test_motor_dash_joined_serial_stays_whole() {
        let code = motor().parse("(1P52FMH-1234567)").unwrap();
        assert_eq!(code.code, "1P52FMH1234567");
    }

    #[test]
    fn test_fallback_to_cleaned_text() {
        let code = motor().parse("AB 12 C3").unwrap();
        assert_eq!(code.code, "AB12C3");
        assert!(code.is_fallback());
        assert_eq!(code.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_fallback_window() {
        let err = chassis().parse("AB 12 C3").unwrap_err();
        assert!(matches!(err, ScanError::NoFieldsResolved(_)));

        let err = motor().parse("X1").unwrap_err();
        assert!(matches!(err, ScanError::NoFieldsResolved(_)));

        let err = motor().parse("---").unwrap_err();
        assert!(matches!(err, ScanError::NoFieldsResolved(_)));
    }
}
