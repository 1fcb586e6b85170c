//! Common regex patterns for identity-card and vehicle-plate extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // National ID: 14 contiguous digits not touching other digits
    pub static ref NATIONAL_ID_STRICT: Regex = Regex::new(
        r"(?:^|[^0-9])([0-9]{14})(?:[^0-9]|$)"
    ).unwrap();

    // National ID split into groups by spaces, dots or dashes
    pub static ref NATIONAL_ID_SPACED: Regex = Regex::new(
        r"(?:^|[^0-9 \t.\-])[ \t.\-]*([0-9](?:[ \t.\-]?[0-9]){13})[ \t.\-]*(?:[^0-9 \t.\-]|$)"
    ).unwrap();

    // Loose alphanumeric run, filtered down to digits afterwards
    pub static ref NATIONAL_ID_LOOSE: Regex = Regex::new(
        r"[A-Za-z0-9]{10,17}"
    ).unwrap();

    // Mobile phone: optional country code, 01 + operator digit + 8 digits
    pub static ref MOBILE_PHONE: Regex = Regex::new(
        r"(?:^|[^0-9])(?:\+?20[ \-]?)?(01[0125](?:[ \-]?[0-9]){8})(?:[^0-9]|$)"
    ).unwrap();

    // Any digit (after correction)
    pub static ref ANY_DIGIT: Regex = Regex::new(r"[0-9]").unwrap();

    // Long digit runs (identifiers, phone numbers) removed from address fragments
    pub static ref LONG_DIGIT_RUN: Regex = Regex::new(r"[0-9][0-9 \-]{8,}[0-9]").unwrap();

    // Arabic letters (hamza through yeh, with harakat)
    pub static ref ARABIC_LETTER: Regex = Regex::new(r"[\u{0621}-\u{064A}]").unwrap();

    // Characters that are not part of a name
    pub static ref NON_NAME_CHARS: Regex = Regex::new(r"[^\u{0621}-\u{0652}\s]").unwrap();

    // Runs of whitespace
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Labels engraved or printed next to vehicle identifiers
    pub static ref VEHICLE_LABEL: Regex = Regex::new(
        r"^(?:VIN|NO|NUMBER|CHASSIS|FRAME|ENGINE|MOTOR|SERIAL|MODEL|TYPE)$"
    ).unwrap();
}
