//! Document and extraction result models.
//!
//! Field names serialize in camelCase (`nationalId`, `birthDate`, ...) so a
//! confirmed result can be handed to record persistence without remapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ScanError};

/// Sentinel stored in unresolved name/address fields.
pub const UNKNOWN_MARKER: &str = "غير معروف";

/// Kind of document being scanned. Selects the field parser and pattern set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// National identity card.
    IdentityCard,
    /// Engraved vehicle motor-fingerprint plate.
    MotorFingerprint,
    /// Vehicle chassis / VIN plate.
    ChassisNumber,
}

impl DocumentType {
    /// Whether this document carries a single vehicle identifier.
    pub fn is_vehicle(&self) -> bool {
        matches!(self, Self::MotorFingerprint | Self::ChassisNumber)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityCard => "identity_card",
            Self::MotorFingerprint => "motor_fingerprint",
            Self::ChassisNumber => "chassis_number",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "identity_card" | "id_card" | "id" => Ok(Self::IdentityCard),
            "motor_fingerprint" | "motor" | "fingerprint" => Ok(Self::MotorFingerprint),
            "chassis_number" | "chassis" | "vin" => Ok(Self::ChassisNumber),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

/// Sex encoded in the national identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Display label used on the review form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "ذكر",
            Self::Female => "أنثى",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

/// Fields recovered from an identity card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCardFields {
    /// Holder name, or the unknown marker.
    pub name: String,

    /// 14-digit national identifier, or empty.
    pub national_id: String,

    /// Address, or the unknown marker.
    pub address: String,

    /// Mobile phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Birth date decoded from the national identifier (`DD/MM/YYYY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    /// Sex decoded from the national identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl IdentityCardFields {
    /// An empty record with every required field set to its sentinel.
    pub fn unresolved(unknown_marker: &str) -> Self {
        Self {
            name: unknown_marker.to_string(),
            national_id: String::new(),
            address: unknown_marker.to_string(),
            phone: None,
            birth_date: None,
            gender: None,
        }
    }

    /// Whether the national identifier is exactly 14 ASCII digits.
    pub fn has_national_id(&self) -> bool {
        self.national_id.len() == 14 && self.national_id.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn has_name(&self, unknown_marker: &str) -> bool {
        is_resolved(&self.name, unknown_marker)
    }

    pub fn has_address(&self, unknown_marker: &str) -> bool {
        is_resolved(&self.address, unknown_marker)
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

fn is_resolved(value: &str, unknown_marker: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != unknown_marker
}

/// A single vehicle identifier (motor fingerprint or chassis number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCodeFields {
    /// Cleaned uppercase alphanumeric code.
    pub code: String,
}

/// Fields extracted for a given document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "documentType", rename_all = "snake_case")]
pub enum ExtractedFields {
    IdentityCard(IdentityCardFields),
    MotorFingerprint(VehicleCodeFields),
    ChassisNumber(VehicleCodeFields),
}

impl ExtractedFields {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::IdentityCard(_) => DocumentType::IdentityCard,
            Self::MotorFingerprint(_) => DocumentType::MotorFingerprint,
            Self::ChassisNumber(_) => DocumentType::ChassisNumber,
        }
    }

    /// Wrap a vehicle code in the variant matching `doc_type`.
    ///
    /// Returns `None` for identity cards.
    pub fn vehicle(doc_type: DocumentType, code: String) -> Option<Self> {
        let fields = VehicleCodeFields { code };
        match doc_type {
            DocumentType::MotorFingerprint => Some(Self::MotorFingerprint(fields)),
            DocumentType::ChassisNumber => Some(Self::ChassisNumber(fields)),
            DocumentType::IdentityCard => None,
        }
    }

    pub fn as_identity_card(&self) -> Option<&IdentityCardFields> {
        match self {
            Self::IdentityCard(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn vehicle_code(&self) -> Option<&str> {
        match self {
            Self::MotorFingerprint(fields) | Self::ChassisNumber(fields) => Some(&fields.code),
            Self::IdentityCard(_) => None,
        }
    }
}

/// Externally visible outcome of one extraction call.
///
/// Always produced, even when extraction fails; a caller seeing
/// `success == false` must route the user to manual entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Whether the minimum viable fields were recovered above the threshold.
    pub success: bool,

    /// Recovered fields (kept on low-confidence results to seed manual entry).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ExtractedFields>,

    /// Confidence score (0 - 100).
    pub confidence: u8,

    /// Advisory error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Machine-readable error classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Non-fatal diagnostics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Name of the recognizer whose text was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognizer: Option<String>,

    /// Wall-clock time of the whole call in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// A hard failure: no fields, zero confidence.
    pub fn failure(error: &ScanError, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            fields: None,
            confidence: 0,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            warnings: Vec::new(),
            recognizer: None,
            processing_time_ms,
        }
    }

    /// Whether the caller has to present the manual-entry form.
    pub fn requires_manual_entry(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_from_str() {
        assert_eq!("id-card".parse::<DocumentType>(), Ok(DocumentType::IdentityCard));
        assert_eq!("VIN".parse::<DocumentType>(), Ok(DocumentType::ChassisNumber));
        assert_eq!(
            "motor_fingerprint".parse::<DocumentType>(),
            Ok(DocumentType::MotorFingerprint)
        );
        assert!("passport".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_identity_fields_serialize_camel_case() {
        let mut fields = IdentityCardFields::unresolved(UNKNOWN_MARKER);
        fields.national_id = "29503150123456".to_string();
        fields.birth_date = Some("15/03/1995".to_string());
        fields.gender = Some(Gender::Male);

        let json = serde_json::to_value(ExtractedFields::IdentityCard(fields)).unwrap();
        assert_eq!(json["documentType"], "identity_card");
        assert_eq!(json["nationalId"], "29503150123456");
        assert_eq!(json["birthDate"], "15/03/1995");
        assert_eq!(json["gender"], "male");
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn test_resolved_checks() {
        let mut fields = IdentityCardFields::unresolved(UNKNOWN_MARKER);
        assert!(!fields.has_name(UNKNOWN_MARKER));
        assert!(!fields.has_national_id());

        fields.name = "محمد احمد علي".to_string();
        fields.national_id = "2950315012345".to_string();
        assert!(fields.has_name(UNKNOWN_MARKER));
        assert!(!fields.has_national_id());
    }

    #[test]
    fn test_failure_result() {
        let result = ExtractionResult::failure(&ScanError::NoTextFound, 12);
        assert!(!result.success);
        assert!(result.requires_manual_entry());
        assert_eq!(result.confidence, 0);
        assert_eq!(result.error_kind, Some(ErrorKind::NoTextFound));
    }
}
