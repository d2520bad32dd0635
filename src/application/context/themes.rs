//! Recurring-theme detection over conversation text.
//!
//! Deliberately shallow: case-insensitive substring checks against a fixed
//! keyword table. Anything smarter belongs to the AI platform, not here.

/// Theme label paired with the substrings that indicate it.
const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    ("work", &["work", "job", "boss", "career", "deadline"]),
    (
        "family",
        &["family", "mother", "father", "parent", "sister", "brother"],
    ),
    (
        "anxiety",
        &["anxious", "anxiety", "worried", "worry", "panic", "overwhelmed"],
    ),
    (
        "relationships",
        &["partner", "relationship", "friend", "lonely", "breakup"],
    ),
    ("sleep", &["sleep", "tired", "insomnia", "exhausted"]),
    ("grief", &["grief", "loss", "miss them", "passed away"]),
];

/// Scans conversation texts and returns the theme labels that appear,
/// in table order.
pub fn detect_themes<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let lowered: Vec<String> = texts.map(str::to_lowercase).collect();
    THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| {
            lowered
                .iter()
                .any(|text| keywords.iter().any(|kw| text.contains(kw)))
        })
        .map(|(label, _)| (*label).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_themes_case_insensitively() {
        let texts = ["My BOSS keeps piling on deadlines", "I feel so anxious lately"];
        let themes = detect_themes(texts.iter().copied());
        assert_eq!(themes, vec!["work", "anxiety"]);
    }

    #[test]
    fn no_themes_for_unmatched_text() {
        let texts = ["the weather was nice today"];
        assert!(detect_themes(texts.iter().copied()).is_empty());
    }

    #[test]
    fn empty_input_yields_no_themes() {
        assert!(detect_themes(std::iter::empty()).is_empty());
    }
}
