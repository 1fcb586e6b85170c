//! Identity-card field parser.

use std::time::Instant;

use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::document::{IdentityCardFields, UNKNOWN_MARKER};

use super::rules::{
    correct_digits, select_address, select_name, FieldExtractor, NationalIdExtractor,
    PhoneExtractor, ScriptLines,
};

/// Rule-based parser for national identity cards.
///
/// Never fails: unresolved name and address carry the unknown marker, an
/// unresolved national ID is empty. Birth date and gender are left to the
/// decoder.
pub struct IdentityCardParser {
    /// Marker for unresolved text fields.
    unknown_marker: String,
    /// Separator used when joining address fragments.
    address_separator: String,
    /// Minimum name length in characters.
    name_min_chars: usize,
    /// Maximum name length in characters.
    name_max_chars: usize,
}

impl IdentityCardParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            unknown_marker: UNKNOWN_MARKER.to_string(),
            address_separator: " - ".to_string(),
            name_min_chars: 5,
            name_max_chars: 50,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            unknown_marker: config.unknown_marker.clone(),
            address_separator: config.address_separator.clone(),
            name_min_chars: config.name_min_chars,
            name_max_chars: config.name_max_chars,
        }
    }

    /// Set the unknown marker.
    pub fn with_unknown_marker(mut self, marker: impl Into<String>) -> Self {
        self.unknown_marker = marker.into();
        self
    }

    /// Set the address separator.
    pub fn with_address_separator(mut self, separator: impl Into<String>) -> Self {
        self.address_separator = separator.into();
        self
    }

    /// Set the accepted name length window.
    pub fn with_name_window(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.name_min_chars = min_chars;
        self.name_max_chars = max_chars.max(min_chars);
        self
    }

    pub fn unknown_marker(&self) -> &str {
        &self.unknown_marker
    }

    /// Parse recognized text into identity-card fields.
    pub fn parse(&self, text: &str) -> IdentityCardFields {
        let start = Instant::now();
        info!("Parsing identity card from {} characters of text", text.len());

        let corrected = correct_digits(text);
        let mut fields = IdentityCardFields::unresolved(&self.unknown_marker);

        if let Some(id) = NationalIdExtractor::new().extract(&corrected) {
            debug!("National ID found via {:?}", id.source);
            fields.national_id = id.value;
        }

        if let Some(phone) = PhoneExtractor::new().extract(&corrected) {
            fields.phone = Some(phone.value);
        }

        let lines = ScriptLines::from_text(&corrected);
        debug!("{} native-script lines", lines.len());

        let name = select_name(&lines, self.name_min_chars, self.name_max_chars);
        let name_index = name.as_ref().map(|(index, _)| *index);
        if let Some((_, name)) = name {
            fields.name = name;
        }

        if let Some(address) = select_address(&lines, name_index, &self.address_separator) {
            fields.address = address;
        }

        debug!(
            "Identity card parsed in {}ms",
            start.elapsed().as_millis()
        );

        fields
    }
}

impl Default for IdentityCardParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CARD: &str = "جمهورية مصر العربية\n\
        بطاقة تحقيق الشخصية\n\
        محمد احمد عبد الله\n\
        ١٥ شارع التحرير الدقي\n\
        الجيزة\n\
        ٢٩٥٠٣١٥٠١٢٣٤٥٦\n\
        01012345678";

    #[test]
    fn test_parse_full_card() {
        let fields = IdentityCardParser::new().parse(CARD);
        assert_eq!(fields.name, "محمد احمد عبد الله");
        assert_eq!(fields.national_id, "29503150123456");
        assert_eq!(fields.address, "الجيزة");
        assert_eq!(fields.phone.as_deref(), Some("01012345678"));
        assert_eq!(fields.birth_date, None);
        assert_eq!(fields.gender, None);
    }

    #[test]
    fn test_address_joined_without_governorate() {
        let text = "محمد احمد عبد الله\nشارع التحرير\nعزبة النخل";
        let fields = IdentityCardParser::new()
            .with_address_separator(" | ")
            .parse(text);
        assert_eq!(fields.address, "شارع التحرير | عزبة النخل");
    }

    #[test]
    fn test_single_native_line() {
        let text = "محمد احمد عبد الله سيد";
        let fields = IdentityCardParser::new().parse(text);
        assert_eq!(fields.name, text);
        assert_eq!(fields.address, UNKNOWN_MARKER);
        assert_eq!(fields.national_id, "");
        assert_eq!(fields.phone, None);
    }

    #[test]
    fn test_no_native_lines() {
        let fields = IdentityCardParser::new().parse("29503150123456");
        assert_eq!(fields.national_id, "29503150123456");
        assert_eq!(fields.name, UNKNOWN_MARKER);
        assert_eq!(fields.address, UNKNOWN_MARKER);
    }

    #[test]
    fn test_label_glued_to_national_id() {
        for text in ["ID29503150123456", "S29503150123456", "No.29503150123456"] {
            let fields = IdentityCardParser::new().parse(text);
            assert_eq!(fields.national_id, "29503150123456", "input {text}");
        }
    }

    #[test]
    fn test_empty_text() {
        let fields = IdentityCardParser::new()
            .with_unknown_marker("?")
            .parse("");
        assert_eq!(fields, IdentityCardFields::unresolved("?"));
    }

    #[test]
    fn test_from_config() {
        let config = ExtractionConfig {
            name_min_chars: 25,
            ..Default::default()
        };
        let fields = IdentityCardParser::from_config(&config).parse("محمد احمد عبد الله");
        assert_eq!(fields.name, UNKNOWN_MARKER);
    }
}
