//! Native-script line handling: name and address selection.

use super::patterns::{ANY_DIGIT, ARABIC_LETTER, LONG_DIGIT_RUN, NON_NAME_CHARS, WHITESPACE_RUN};

/// Administrative regions printed on the address lines, with common spelling
/// variants.
pub const GOVERNORATES: &[&str] = &[
    "القاهرة",
    "القاهره",
    "الجيزة",
    "الجيزه",
    "الإسكندرية",
    "الاسكندرية",
    "الاسكندريه",
    "القليوبية",
    "القليوبيه",
    "الشرقية",
    "الشرقيه",
    "الدقهلية",
    "الدقهليه",
    "الغربية",
    "الغربيه",
    "المنوفية",
    "المنوفيه",
    "البحيرة",
    "البحيره",
    "كفر الشيخ",
    "دمياط",
    "بورسعيد",
    "بور سعيد",
    "الإسماعيلية",
    "الاسماعيلية",
    "الاسماعيليه",
    "السويس",
    "الفيوم",
    "بني سويف",
    "بنى سويف",
    "المنيا",
    "أسيوط",
    "اسيوط",
    "سوهاج",
    "قنا",
    "الأقصر",
    "الاقصر",
    "أسوان",
    "اسوان",
    "البحر الأحمر",
    "البحر الاحمر",
    "الوادي الجديد",
    "الوادى الجديد",
    "مطروح",
    "شمال سيناء",
    "جنوب سيناء",
];

/// Card header phrases that never carry personal data.
const HEADER_PHRASES: &[&str] = &[
    "جمهورية مصر العربية",
    "جمهوريه مصر العربيه",
    "بطاقة تحقيق الشخصية",
    "بطاقه تحقيق الشخصيه",
    "بطاقة تحقيق شخصية",
    "وزارة الداخلية",
    "وزاره الداخليه",
    "قطاع الأحوال المدنية",
    "قطاع الاحوال المدنية",
    "مصلحة الأحوال المدنية",
    "مصلحة الاحوال المدنية",
];

/// A recognized line that contains native-script letters.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeLine {
    /// Position among the native-script lines.
    pub index: usize,
    /// Line as recognized, trimmed.
    pub raw: String,
    /// Whether the line contains any digit.
    pub has_digits: bool,
}

impl NativeLine {
    /// Letters and spaces only, whitespace collapsed.
    pub fn cleaned_name(&self) -> String {
        let stripped = NON_NAME_CHARS.replace_all(&self.raw, " ");
        WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
    }

    /// Line without identifier-length digit runs, whitespace collapsed.
    pub fn address_fragment(&self) -> Option<String> {
        let without_ids = LONG_DIGIT_RUN.replace_all(&self.raw, " ");
        let collapsed = WHITESPACE_RUN.replace_all(without_ids.trim(), " ");
        let fragment = collapsed.trim_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());

        ARABIC_LETTER
            .is_match(fragment)
            .then(|| fragment.to_string())
    }
}

/// Native-script lines of a recognized text, header lines removed.
#[derive(Debug, Clone, Default)]
pub struct ScriptLines {
    lines: Vec<NativeLine>,
}

impl ScriptLines {
    /// Split digit-corrected text into native-script lines.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| ARABIC_LETTER.is_match(line))
            .filter(|line| !is_header(line))
            .enumerate()
            .map(|(index, line)| NativeLine {
                index,
                raw: line.to_string(),
                has_digits: ANY_DIGIT.is_match(line),
            })
            .collect();

        Self { lines }
    }

    pub fn lines(&self) -> &[NativeLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

fn is_header(line: &str) -> bool {
    let collapsed = WHITESPACE_RUN.replace_all(line, " ");
    HEADER_PHRASES.iter().any(|phrase| collapsed.contains(phrase))
}

/// Pick the name: the longest digit-free line whose cleaned length is within
/// `[min_chars, max_chars]`. Ties keep the earlier line.
///
/// Returns the line index and the cleaned name.
pub fn select_name(
    lines: &ScriptLines,
    min_chars: usize,
    max_chars: usize,
) -> Option<(usize, String)> {
    let mut best: Option<(usize, String, usize)> = None;

    for line in lines.lines().iter().filter(|l| !l.has_digits) {
        let name = line.cleaned_name();
        let len = name.chars().count();
        if len < min_chars || len > max_chars {
            continue;
        }
        if best.as_ref().is_none_or(|(_, _, best_len)| len > *best_len) {
            best = Some((line.index, name, len));
        }
    }

    best.map(|(index, name, _)| (index, name))
}

/// Build the address from every line except the name line.
///
/// A fragment naming a governorate is preferred; otherwise all fragments
/// are joined with `separator`.
pub fn select_address(
    lines: &ScriptLines,
    name_index: Option<usize>,
    separator: &str,
) -> Option<String> {
    let fragments: Vec<String> = lines
        .lines()
        .iter()
        .filter(|l| Some(l.index) != name_index)
        .filter_map(NativeLine::address_fragment)
        .collect();

    if fragments.is_empty() {
        return None;
    }

    if let Some(fragment) = fragments
        .iter()
        .find(|f| GOVERNORATES.iter().any(|g| f.contains(g)))
    {
        return Some(fragment.clone());
    }

    Some(fragments.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_script_lines_skip_latin_and_headers() {
        let text = "جمهورية مصر العربية\nID CARD\nمحمد احمد علي\n12345\nشارع التحرير";
        let lines = ScriptLines::from_text(text);
        let raws: Vec<&str> = lines.lines().iter().map(|l| l.raw.as_str()).collect();
        assert_eq!(raws, vec!["محمد احمد علي", "شارع التحرير"]);
    }

    #[test]
    fn test_select_longest_name() {
        let text = "علي حسن\nمحمد عبد الرحمن السيد\n15 شارع النيل الجيزة";
        let lines = ScriptLines::from_text(text);
        let (index, name) = select_name(&lines, 5, 50).unwrap();
        assert_eq!(index, 1);
        assert_eq!(name, "محمد عبد الرحمن السيد");
    }

    #[test]
    fn test_name_window() {
        let lines = ScriptLines::from_text("علي\n");
        assert_eq!(select_name(&lines, 5, 50), None);

        let long = "محمد ".repeat(12);
        let lines = ScriptLines::from_text(&long);
        assert_eq!(select_name(&lines, 5, 50), None);
    }

    #[test]
    fn test_name_strips_punctuation() {
        let lines = ScriptLines::from_text("الاسم: محمد  احمد.");
        let (_, name) = select_name(&lines, 5, 50).unwrap();
        assert_eq!(name, "الاسم محمد احمد");
    }

    #[test]
    fn test_name_tie_keeps_first() {
        let lines = ScriptLines::from_text("سعيد كامل\nكريم فؤاد");
        let (index, _) = select_name(&lines, 5, 50).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_address_prefers_governorate() {
        let text = "محمد احمد علي حسن\nشارع التحرير\nقسم الدقي الجيزة\nرقم 29503150123456";
        let lines = ScriptLines::from_text(text);
        let (name_index, _) = select_name(&lines, 5, 50).unwrap();
        let address = select_address(&lines, Some(name_index), " - ");
        assert_eq!(address.as_deref(), Some("قسم الدقي الجيزة"));
    }

    #[test]
    fn test_address_joins_fragments() {
        let text = "محمد احمد علي حسن\n12 شارع الجمهورية\nرقم 29503150123456 عزبة النخل";
        let lines = ScriptLines::from_text(text);
        let (name_index, _) = select_name(&lines, 5, 50).unwrap();
        let address = select_address(&lines, Some(name_index), " - ");
        assert_eq!(
            address.as_deref(),
            Some("12 شارع الجمهورية - رقم عزبة النخل")
        );
    }

    #[test]
    fn test_address_none_without_fragments() {
        let lines = ScriptLines::from_text("محمد احمد علي");
        assert_eq!(select_address(&lines, Some(0), " - "), None);
        assert_eq!(select_address(&ScriptLines::default(), None, " - "), None);
    }
}
