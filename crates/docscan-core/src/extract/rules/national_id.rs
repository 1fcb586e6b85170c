//! National identifier extraction and decoding.
//!
//! The identifier is 14 digits. Digits 2-7 (1-indexed) hold the birth date
//! as YYMMDD and digit 13 encodes sex by parity.

use chrono::NaiveDate;

use super::correction::correct_digits;
use super::patterns::{NATIONAL_ID_LOOSE, NATIONAL_ID_SPACED, NATIONAL_ID_STRICT};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::document::Gender;

/// Length of a national identifier.
pub const NATIONAL_ID_LEN: usize = 14;

/// Default two-digit year pivot; years above it belong to the 1900s.
pub const DEFAULT_CENTURY_PIVOT: u8 = 30;

/// Strategy that produced a national-ID candidate, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NationalIdStrategy {
    /// 14 contiguous digits.
    Strict,
    /// 14 digits separated by spaces, dots or dashes.
    Spaced,
    /// Alphanumeric run of 10-17 characters holding exactly 14 digits.
    Loose,
}

impl NationalIdStrategy {
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Strict => 0.95,
            Self::Spaced => 0.85,
            Self::Loose => 0.6,
        }
    }
}

/// National ID field extractor.
///
/// Expects text that already went through digit correction.
pub struct NationalIdExtractor {
    allow_loose: bool,
}

impl NationalIdExtractor {
    pub fn new() -> Self {
        Self { allow_loose: true }
    }

    /// Set whether the loose alphanumeric strategy may be used.
    pub fn with_loose_matching(mut self, allow: bool) -> Self {
        self.allow_loose = allow;
        self
    }

    fn strategy_matches(
        &self,
        strategy: NationalIdStrategy,
        text: &str,
    ) -> Vec<ExtractionMatch<String>> {
        let confidence = strategy.confidence();
        match strategy {
            NationalIdStrategy::Strict | NationalIdStrategy::Spaced => {
                let regex = if strategy == NationalIdStrategy::Strict {
                    &*NATIONAL_ID_STRICT
                } else {
                    &*NATIONAL_ID_SPACED
                };
                regex
                    .captures_iter(text)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| {
                        let digits = digits_only(m.as_str());
                        ExtractionMatch::new(digits, confidence, m.as_str())
                    })
                    .collect()
            }
            NationalIdStrategy::Loose => NATIONAL_ID_LOOSE
                .find_iter(text)
                .filter_map(|m| {
                    let digits = digits_only(m.as_str());
                    (digits.len() == NATIONAL_ID_LEN).then(|| {
                        ExtractionMatch::new(digits, confidence, m.as_str())
                    })
                })
                .collect(),
        }
    }
}

impl Default for NationalIdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for NationalIdExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All candidates, strict matches first, then spaced, then loose.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut strategies = vec![NationalIdStrategy::Strict, NationalIdStrategy::Spaced];
        if self.allow_loose {
            strategies.push(NationalIdStrategy::Loose);
        }

        let mut results: Vec<Self::Output> = Vec::new();
        for strategy in strategies {
            for candidate in self.strategy_matches(strategy, text) {
                // Skip if already found by a stricter strategy
                if results.iter().any(|r| r.value == candidate.value) {
                    continue;
                }
                results.push(candidate);
            }
        }

        results
    }
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Correct digit confusions, then extract the first national ID.
pub fn extract_national_id(text: &str) -> Option<String> {
    NationalIdExtractor::new()
        .extract(&correct_digits(text))
        .map(|m| m.value)
}

/// Birth date and sex derived from a national identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedNationalId {
    pub birth_year: u16,
    pub birth_month: u8,
    pub birth_day: u8,
    pub gender: Gender,
}

impl DecodedNationalId {
    /// Birth date formatted as `DD/MM/YYYY`, exactly as encoded.
    pub fn birth_date(&self) -> String {
        format!(
            "{:02}/{:02}/{:04}",
            self.birth_day, self.birth_month, self.birth_year
        )
    }

    /// The birth date as a calendar date, if it is one.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.birth_year as i32,
            self.birth_month as u32,
            self.birth_day as u32,
        )
    }
}

/// Pure decoder for national identifiers.
#[derive(Debug, Clone, Copy)]
pub struct NationalIdDecoder {
    century_pivot: u8,
}

impl NationalIdDecoder {
    pub fn new() -> Self {
        Self {
            century_pivot: DEFAULT_CENTURY_PIVOT,
        }
    }

    /// Set the two-digit year pivot.
    pub fn with_century_pivot(mut self, pivot: u8) -> Self {
        self.century_pivot = pivot.min(99);
        self
    }

    /// Decode birth date and sex.
    ///
    /// Returns `None` only when `id` is not exactly 14 ASCII digits. Every
    /// syntactically valid identifier decodes, including ones whose date is
    /// not a real calendar date.
    pub fn decode(&self, id: &str) -> Option<DecodedNationalId> {
        let digits = id.as_bytes();
        if digits.len() != NATIONAL_ID_LEN || !digits.iter().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let pair = |i: usize| (digits[i] - b'0') * 10 + (digits[i + 1] - b'0');

        let yy = pair(1);
        let century = if yy > self.century_pivot { 1900 } else { 2000 };
        let gender = if (digits[12] - b'0') % 2 == 1 {
            Gender::Male
        } else {
            Gender::Female
        };

        Some(DecodedNationalId {
            birth_year: century + yy as u16,
            birth_month: pair(3),
            birth_day: pair(5),
            gender,
        })
    }
}

impl Default for NationalIdDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode with the default century pivot.
pub fn decode_national_id(id: &str) -> Option<DecodedNationalId> {
    NationalIdDecoder::new().decode(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_example() {
        let decoded = decode_national_id("29503150123456").unwrap();
        assert_eq!(decoded.birth_date(), "15/03/1995");
        assert_eq!(decoded.gender, Gender::Male);
        assert_eq!(decoded.calendar_date(), NaiveDate::from_ymd_opt(1995, 3, 15));
    }

    #[test]
    fn test_decode_century_pivot() {
        let decoded = decode_national_id("30501010123428").unwrap();
        assert_eq!(decoded.birth_year, 2005);
        assert_eq!(decoded.gender, Gender::Female);

        // Exactly at the pivot stays in the 2000s
        assert_eq!(decode_national_id("33001010123428").unwrap().birth_year, 2030);
        assert_eq!(decode_national_id("23101010123428").unwrap().birth_year, 1931);

        let decoder = NationalIdDecoder::new().with_century_pivot(10);
        assert_eq!(decoder.decode("22001010123428").unwrap().birth_year, 1920);
    }

    #[test]
    fn test_decode_implausible_date_is_surfaced() {
        let decoded = decode_national_id("29913990123456").unwrap();
        assert_eq!(decoded.birth_date(), "99/13/1999");
        assert_eq!(decoded.calendar_date(), None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_national_id("2950315012345").is_none());
        assert!(decode_national_id("295031501234567").is_none());
        assert!(decode_national_id("2950315012345X").is_none());
        assert!(decode_national_id("٢٩٥٠٣١٥٠١٢٣٤٥٦").is_none());
    }

    #[test]
    fn test_decode_total_and_deterministic() {
        let decoder = NationalIdDecoder::new();
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..2_000 {
            let id: String = (0..NATIONAL_ID_LEN)
                .map(|_| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    char::from(b'0' + ((state >> 33) % 10) as u8)
                })
                .collect();

            let first = decoder.decode(&id).expect("valid identifiers always decode");
            let second = decoder.decode(&id).unwrap();
            assert_eq!(first, second);
            assert!((1900..=2099).contains(&first.birth_year));
            assert_eq!(first.birth_date().len(), 10);
        }
    }

    #[test]
    fn test_extract_strict_first_occurrence() {
        let text = "الرقم القومي 29503150123456\nرقم آخر 30101010123456";
        assert_eq!(extract_national_id(text), Some("29503150123456".to_string()));
    }

    #[test]
    fn test_extract_spaced() {
        let text = "... 2 9 5 0 3 1 5 0 1 2 3 4 5 6 ...";
        assert_eq!(extract_national_id(text), Some("29503150123456".to_string()));
    }

    #[test]
    fn test_extract_native_digits_and_confusions() {
        assert_eq!(
            extract_national_id("٢٩٥٠٣١٥٠١٢٣٤٥٦"),
            Some("29503150123456".to_string())
        );
        assert_eq!(
            extract_national_id("رقم 2950315O12345b"),
            Some("29503150123456".to_string())
        );
    }

    #[test]
    fn test_extract_loose() {
        let extractor = NationalIdExtractor::new();
        let results = extractor.extract_all("ID 29503X150123456");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, "29503150123456");
        assert_eq!(results[0].confidence, NationalIdStrategy::Loose.confidence());

        let strict_only = NationalIdExtractor::new().with_loose_matching(false);
        assert!(strict_only.extract("ID 29503X150123456").is_none());
    }

    #[test]
    fn test_round_trip_injected_digits() {
        let ids = ["29503150123456", "30012310100011", "28807072101987"];
        let templates = [
            "جمهورية مصر العربية\n{}\nمحمد احمد",
            "{}",
            "الرقم القومى: {} القاهرة",
            "ID{}",
            "S{}",
            "No.{}",
            "({})",
            "{}/2019",
            "-{}-",
            "الرقم القومى:{}S",
        ];
        for id in ids {
            for template in templates {
                let text = template.replace("{}", id);
                assert_eq!(extract_national_id(&text).as_deref(), Some(id));
            }
        }
    }
}
