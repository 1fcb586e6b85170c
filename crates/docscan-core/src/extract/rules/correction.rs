//! Character substitution tables for common recognizer misreads.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::national_id::NATIONAL_ID_LEN;

lazy_static! {
    /// Arabic-Indic and Eastern Arabic-Indic digits, always folded to ASCII.
    pub static ref NATIVE_DIGITS: HashMap<char, char> = {
        let mut m = HashMap::new();
        for (i, ascii) in ('0'..='9').enumerate() {
            m.insert(char::from_u32(0x0660 + i as u32).unwrap(), ascii);
            m.insert(char::from_u32(0x06F0 + i as u32).unwrap(), ascii);
        }
        m
    };

    /// Glyphs a recognizer confuses with digits. Only replaced inside digit runs.
    pub static ref CONFUSABLE_GLYPHS: HashMap<char, char> = {
        let mut m = HashMap::new();
        for c in ['O', 'o', 'Q', 'D'] {
            m.insert(c, '0');
        }
        for c in ['I', 'l', 'i', '|', '!'] {
            m.insert(c, '1');
        }
        m.insert('Z', '2');
        m.insert('z', '2');
        m.insert('S', '5');
        m.insert('s', '5');
        m.insert('G', '6');
        m.insert('b', '6');
        m.insert('T', '7');
        m.insert('B', '8');
        m.insert('g', '9');
        m.insert('q', '9');
        m
    };

    /// Letters a VIN never contains, mapped to the digit they are misread for.
    pub static ref VIN_REPAIRS: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('I', '1');
        m.insert('O', '0');
        m.insert('Q', '0');
        m
    };
}

/// Separators allowed inside a digit run.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '-' | '.')
}

/// Fold native digits to ASCII, leaving everything else untouched.
pub fn fold_native_digits(text: &str) -> String {
    text.chars()
        .map(|c| NATIVE_DIGITS.get(&c).copied().unwrap_or(c))
        .collect()
}

/// Fold native digits and replace confusable glyphs inside digit runs.
///
/// A run is a stretch of digits and confusable glyphs, possibly broken by
/// separators. Glyphs between two digits of a run are always replaced, so
/// `2950315O123456` becomes `29503150123456`. Glyphs at the edge of a run are
/// replaced only while the run stays within identifier length: `OI23`
/// becomes `0123`, but the label in `ID29503150123456` is kept so the
/// 14-digit run is not lengthened. Runs without a digit are kept.
pub fn correct_digits(text: &str) -> String {
    let mut chars: Vec<char> = fold_native_digits(text).chars().collect();

    let mut i = 0;
    while i < chars.len() {
        if !is_run_char(chars[i]) {
            i += 1;
            continue;
        }

        let mut end = i;
        while end < chars.len() && (is_run_char(chars[end]) || is_separator(chars[end])) {
            end += 1;
        }
        correct_run(&mut chars[i..end]);
        i = end;
    }

    chars.into_iter().collect()
}

fn is_run_char(c: char) -> bool {
    c.is_ascii_digit() || CONFUSABLE_GLYPHS.contains_key(&c)
}

fn correct_run(run: &mut [char]) {
    let (Some(first), Some(last)) = (
        run.iter().position(|c| c.is_ascii_digit()),
        run.iter().rposition(|c| c.is_ascii_digit()),
    ) else {
        return;
    };

    let significant = run.iter().filter(|c| !is_separator(**c)).count();
    let fix_edges = significant <= NATIONAL_ID_LEN;

    for (i, c) in run.iter_mut().enumerate() {
        let interior = i > first && i < last;
        if interior || fix_edges {
            if let Some(&digit) = CONFUSABLE_GLYPHS.get(c) {
                *c = digit;
            }
        }
    }
}

/// Repair a 17-character token whose only VIN violations are `I`, `O` or `Q`.
///
/// Returns `None` when the token is not 17 characters long or contains no
/// repairable letter.
pub fn repair_vin(token: &str) -> Option<String> {
    if token.chars().count() != 17 || !token.chars().any(|c| VIN_REPAIRS.contains_key(&c)) {
        return None;
    }
    Some(
        token
            .chars()
            .map(|c| VIN_REPAIRS.get(&c).copied().unwrap_or(c))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_native_digits() {
        assert_eq!(fold_native_digits("٢٩٥٠٣١٥"), "2950315");
        assert_eq!(fold_native_digits("۱۲۳ abc"), "123 abc");
    }

    #[test]
    fn test_correct_letters_inside_numbers() {
        assert_eq!(correct_digits("2950315O123456"), "29503150123456");
        assert_eq!(correct_digits("OI23"), "0123");
        assert_eq!(correct_digits("2 9 S 0"), "2 9 5 0");
    }

    #[test]
    fn test_words_are_kept() {
        assert_eq!(correct_digits("محمد احمد"), "محمد احمد");
        assert_eq!(correct_digits("SOS BIG"), "SOS BIG");
        assert_eq!(correct_digits("Gizeh\n1234"), "Gizeh\n1234");
    }

    #[test]
    fn test_label_glued_to_full_identifier_is_kept() {
        assert_eq!(correct_digits("ID29503150123456"), "ID29503150123456");
        assert_eq!(correct_digits("S29503150123456"), "S29503150123456");
        assert_eq!(correct_digits("29503150123456S"), "29503150123456S");
        assert_eq!(correct_digits("No.29503150123456"), "No.29503150123456");
    }

    #[test]
    fn test_edge_glyphs_fixed_in_short_runs() {
        assert_eq!(correct_digits("2950315O12345b"), "29503150123456");
        assert_eq!(correct_digits("b2950315O12345"), "62950315012345");
    }

    #[test]
    fn test_repair_vin() {
        assert_eq!(
            repair_vin("LJ12EKRIO2345678Q").as_deref(),
            Some("LJ12EKR1023456780")
        );
        assert_eq!(repair_vin("LJ12EKR1234567890"), None);
        assert_eq!(repair_vin("SHORTO"), None);
    }
}
