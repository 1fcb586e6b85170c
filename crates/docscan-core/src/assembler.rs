//! Converts parser output and errors into the externally visible result.

use tracing::{debug, info};

use crate::error::ScanError;
use crate::extract::rules::NationalIdDecoder;
use crate::extract::VehicleCode;
use crate::models::config::ExtractionConfig;
use crate::models::document::{DocumentType, ExtractedFields, ExtractionResult, IdentityCardFields};
use crate::scoring::ConfidenceScorer;

/// Builds [`ExtractionResult`]s. Never fails.
#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    scorer: ConfidenceScorer,
    decoder: NationalIdDecoder,
}

impl ResultAssembler {
    pub fn new(scorer: ConfidenceScorer, decoder: NationalIdDecoder) -> Self {
        Self { scorer, decoder }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::from_config(config),
            decoder: NationalIdDecoder::new().with_century_pivot(config.century_pivot),
        }
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    /// A hard failure: no fields, zero confidence.
    pub fn failure(&self, error: &ScanError) -> ExtractionResult {
        info!("Extraction failed: {}", error);
        ExtractionResult::failure(error, 0)
    }

    /// Finish an identity card: decode birth date and gender, score, and
    /// decide success.
    ///
    /// Success requires a name, a national ID, and a score at or above the
    /// threshold. Anything less is a low-confidence result that keeps the
    /// recovered fields. A card with nothing recovered is a hard failure.
    pub fn assemble_identity(&self, mut fields: IdentityCardFields) -> ExtractionResult {
        let mut warnings = Vec::new();
        let marker = self.scorer.unknown_marker().to_string();

        if fields.has_national_id() {
            if let Some(decoded) = self.decoder.decode(&fields.national_id) {
                fields.birth_date = Some(decoded.birth_date());
                fields.gender = Some(decoded.gender);
                if decoded.calendar_date().is_none() {
                    warnings.push(format!(
                        "national ID encodes an implausible birth date: {}",
                        decoded.birth_date()
                    ));
                }
            }
        } else {
            fields.birth_date = None;
            fields.gender = None;
        }

        let confidence = self.scorer.score_identity(&fields);
        if confidence == 0 {
            return self.failure(&ScanError::NoFieldsResolved(
                "no identity-card field recognized".to_string(),
            ));
        }

        if !fields.has_address(&marker) {
            warnings.push("address not found".to_string());
        }
        if !fields.has_phone() {
            warnings.push("phone not found".to_string());
        }

        let missing = self.scorer.missing_identity_fields(&fields);
        let success = missing.is_empty() && self.scorer.meets_threshold(confidence);
        debug!(
            "Identity card scored {} (threshold {}), missing {:?}",
            confidence,
            self.scorer.min_confidence(),
            missing
        );

        let error = (!success).then(|| ScanError::LowConfidence {
            confidence,
            threshold: self.scorer.min_confidence(),
            missing,
        });

        ExtractionResult {
            success,
            fields: Some(ExtractedFields::IdentityCard(fields)),
            confidence,
            error: error.as_ref().map(ToString::to_string),
            error_kind: error.as_ref().map(ScanError::kind),
            warnings,
            recognizer: None,
            processing_time_ms: 0,
        }
    }

    /// Finish a vehicle identifier.
    pub fn assemble_vehicle(
        &self,
        doc_type: DocumentType,
        parsed: Result<VehicleCode, ScanError>,
    ) -> ExtractionResult {
        let code = match parsed {
            Ok(code) => code,
            Err(e) => return self.failure(&e),
        };

        let confidence = self.scorer.score_vehicle(&code);
        let mut warnings = Vec::new();
        if code.is_fallback() {
            warnings.push(format!(
                "no {} pattern matched; using cleaned text",
                doc_type
            ));
        }

        let fallback = code.is_fallback();
        let Some(fields) = ExtractedFields::vehicle(doc_type, code.code) else {
            return self.failure(&ScanError::Config(format!(
                "{} is not a vehicle document",
                doc_type
            )));
        };

        let success = self.scorer.meets_threshold(confidence);
        let error = (!success).then(|| ScanError::LowConfidence {
            confidence,
            threshold: self.scorer.min_confidence(),
            missing: Vec::new(),
        });
        debug!(
            "{} scored {} (fallback: {})",
            doc_type, confidence, fallback
        );

        ExtractionResult {
            success,
            fields: Some(fields),
            confidence,
            error: error.as_ref().map(ToString::to_string),
            error_kind: error.as_ref().map(ScanError::kind),
            warnings,
            recognizer: None,
            processing_time_ms: 0,
        }
    }
}
