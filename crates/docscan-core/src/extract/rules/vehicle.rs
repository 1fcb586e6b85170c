//! Ordered pattern table for engraved vehicle identifiers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::document::DocumentType;

/// A named identifier pattern with its priority and confidence.
///
/// Lower priority values are tried first.
#[derive(Debug, Clone)]
pub struct VehiclePattern {
    pub name: String,
    pub regex: Regex,
    pub priority: u8,
    /// Confidence (0-100) assigned when this pattern wins.
    pub confidence: u8,
    pub applies_to: Vec<DocumentType>,
}

impl VehiclePattern {
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        priority: u8,
        confidence: u8,
        applies_to: &[DocumentType],
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(pattern)?,
            priority,
            confidence: confidence.min(100),
            applies_to: applies_to.to_vec(),
        })
    }

    pub fn applies_to(&self, doc_type: DocumentType) -> bool {
        self.applies_to.contains(&doc_type)
    }

    /// All matches of this pattern inside a cleaned token.
    pub fn find_in(&self, token: &str) -> Vec<String> {
        self.regex
            .find_iter(token)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

const MOTOR: &[DocumentType] = &[DocumentType::MotorFingerprint];
const CHASSIS: &[DocumentType] = &[DocumentType::ChassisNumber];

lazy_static! {
    static ref DEFAULT_PATTERNS: Vec<VehiclePattern> = vec![
        // Engine model prefix, capacity letters, serial
        VehiclePattern::new("engine_model_serial", r"1P\d{2}[A-Z]{1,3}[A-Z0-9]{5,12}", 10, 95, MOTOR).unwrap(),
        // Three-digit displacement code, letters, serial
        VehiclePattern::new("displacement_serial", r"\d{3}[A-Z]{2,3}\d{5,10}", 20, 93, MOTOR).unwrap(),
        // Manufacturer letters followed by a serial
        VehiclePattern::new("letter_prefixed_serial", r"[A-Z]{2,4}\d{6,12}", 30, 92, MOTOR).unwrap(),
        VehiclePattern::new("generic_motor", r"[A-Z0-9]{6,25}", 90, 90, MOTOR).unwrap(),

        // VIN with a known world manufacturer identifier
        VehiclePattern::new(
            "vin_known_wmi",
            r"^(?:LB|LZ|LJ|LF|LG|LS|LV|JT|JH|JN|JS|KM|KN|MA|MB|WV|WB|WD|VF|SA|ZF|TM|VS|NM)[A-HJ-NPR-Z0-9]{15}$",
            10,
            98,
            CHASSIS,
        )
        .unwrap(),
        VehiclePattern::new("vin", r"^[A-HJ-NPR-Z0-9]{17}$", 20, 95, CHASSIS).unwrap(),
        // Frame numbers on older or locally assembled vehicles
        VehiclePattern::new("frame_number", r"[A-Z]{1,4}\d{6,16}", 30, 92, CHASSIS).unwrap(),
        VehiclePattern::new("generic_chassis", r"[A-Z0-9]{8,20}", 90, 90, CHASSIS).unwrap(),
    ];
}

/// Patterns ordered by ascending priority.
#[derive(Debug, Clone)]
pub struct VehiclePatternSet {
    patterns: Vec<VehiclePattern>,
}

impl VehiclePatternSet {
    pub fn new(patterns: Vec<VehiclePattern>) -> Self {
        let mut set = Self { patterns };
        set.sort();
        set
    }

    /// An empty set, for callers that supply their own table.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Add a pattern, keeping priority order. Equal priorities keep
    /// insertion order.
    pub fn with_pattern(mut self, pattern: VehiclePattern) -> Self {
        self.patterns.push(pattern);
        self.sort();
        self
    }

    /// Patterns for one document type, in priority order.
    pub fn for_document(&self, doc_type: DocumentType) -> impl Iterator<Item = &VehiclePattern> {
        self.patterns.iter().filter(move |p| p.applies_to(doc_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehiclePattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn sort(&mut self) {
        self.patterns.sort_by_key(|p| p.priority);
    }
}

impl Default for VehiclePatternSet {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &VehiclePatternSet, doc_type: DocumentType) -> Vec<String> {
        set.for_document(doc_type).map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_default_order() {
        let set = VehiclePatternSet::default();
        assert_eq!(
            names(&set, DocumentType::MotorFingerprint),
            vec![
                "engine_model_serial",
                "displacement_serial",
                "letter_prefixed_serial",
                "generic_motor"
            ]
        );
        assert_eq!(
            names(&set, DocumentType::ChassisNumber),
            vec!["vin_known_wmi", "vin", "frame_number", "generic_chassis"]
        );
        assert_eq!(set.for_document(DocumentType::IdentityCard).count(), 0);
    }

    #[test]
    fn test_with_pattern_keeps_priority_order() {
        let custom = VehiclePattern::new(
            "workshop_stamp",
            r"WS\d{6}",
            15,
            94,
            &[DocumentType::MotorFingerprint],
        )
        .unwrap();
        let set = VehiclePatternSet::default().with_pattern(custom);
        let motor = names(&set, DocumentType::MotorFingerprint);
        assert_eq!(motor[1], "workshop_stamp");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(VehiclePattern::new("bad", r"[A-Z", 1, 90, CHASSIS).is_err());
    }

    #[test]
    fn test_vin_excludes_ioq() {
        let set = VehiclePatternSet::default();
        let vin = set.iter().find(|p| p.name == "vin").unwrap();
        assert!(vin.regex.is_match("JTDBR32E720123456"));
        assert!(!vin.regex.is_match("JTDBR32E72O123456"));
    }

    #[test]
    fn test_find_in() {
        let set = VehiclePatternSet::default();
        let pattern = set.iter().find(|p| p.name == "letter_prefixed_serial").unwrap();
        assert_eq!(pattern.find_in("XXKB1234567"), vec!["XXKB1234567"]);
        assert!(pattern.find_in("K12").is_empty());
    }
}
