//! Confidence scoring of extracted fields.

use serde::{Deserialize, Serialize};

use crate::extract::VehicleCode;
use crate::models::config::ExtractionConfig;
use crate::models::document::{IdentityCardFields, UNKNOWN_MARKER};

/// Default minimum confidence for a successful extraction.
pub const DEFAULT_MIN_CONFIDENCE: u8 = 40;

/// Per-field weights for identity cards. They should sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityWeights {
    pub national_id: u8,
    pub name: u8,
    pub address: u8,
    pub phone: u8,
}

impl Default for IdentityWeights {
    fn default() -> Self {
        Self {
            national_id: 40,
            name: 30,
            address: 20,
            phone: 10,
        }
    }
}

impl IdentityWeights {
    pub fn total(&self) -> u16 {
        self.national_id as u16 + self.name as u16 + self.address as u16 + self.phone as u16
    }
}

/// Maps extracted fields to a 0-100 score and decides the threshold.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    weights: IdentityWeights,
    min_confidence: u8,
    unknown_marker: String,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self {
            weights: IdentityWeights::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            unknown_marker: UNKNOWN_MARKER.to_string(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            weights: IdentityWeights::default(),
            min_confidence: config.min_confidence.min(100),
            unknown_marker: config.unknown_marker.clone(),
        }
    }

    /// Set identity-card weights.
    pub fn with_weights(mut self, weights: IdentityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the minimum confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = min_confidence.min(100);
        self
    }

    pub fn min_confidence(&self) -> u8 {
        self.min_confidence
    }

    pub fn unknown_marker(&self) -> &str {
        &self.unknown_marker
    }

    /// Sum of the weights of resolved fields, capped at 100.
    ///
    /// Adding a resolved field never lowers the score.
    pub fn score_identity(&self, fields: &IdentityCardFields) -> u8 {
        let mut score: u16 = 0;
        if fields.has_national_id() {
            score += self.weights.national_id as u16;
        }
        if fields.has_name(&self.unknown_marker) {
            score += self.weights.name as u16;
        }
        if fields.has_address(&self.unknown_marker) {
            score += self.weights.address as u16;
        }
        if fields.has_phone() {
            score += self.weights.phone as u16;
        }
        score.min(100) as u8
    }

    /// Pattern confidence for a matched code, the fallback confidence
    /// otherwise. Empty codes score zero.
    pub fn score_vehicle(&self, code: &VehicleCode) -> u8 {
        if code.code.is_empty() {
            0
        } else {
            code.confidence.min(100)
        }
    }

    /// Required identity fields that were not resolved.
    pub fn missing_identity_fields(&self, fields: &IdentityCardFields) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !fields.has_name(&self.unknown_marker) {
            missing.push("name");
        }
        if !fields.has_national_id() {
            missing.push("nationalId");
        }
        missing
    }

    pub fn meets_threshold(&self, confidence: u8) -> bool {
        confidence >= self.min_confidence
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}
