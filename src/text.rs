//! Text utilities shared by the login and extraction pipelines.
//!
//! Eitaa message text routinely mixes Arabic-keyboard glyphs with their
//! Persian equivalents (ي vs ی, ك vs ک). Prefix matching against scraped
//! messages therefore folds the Arabic variants first and then applies
//! NFKC so compatibility forms compare equal.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Fold Arabic-script glyph variants to their Persian letterforms, then
/// apply NFKC normalization.
pub fn normalize_persian(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            // Arabic yeh / alef maksura → Persian yeh
            '\u{064A}' | '\u{0649}' => '\u{06CC}',
            // Arabic kaf → Persian keheh
            '\u{0643}' => '\u{06A9}',
            // Arabic teh marbuta → heh
            '\u{0629}' => '\u{0647}',
            other => other,
        })
        .collect();
    folded.nfkc().collect()
}

/// Normalize a phone number to the international format the login page
/// expects. Only the domestic 11-digit `09…` shape is rewritten
/// (`09123456789` → `989123456789`); anything else passes through
/// unchanged.
pub fn normalize_phone_number(phone: &str) -> String {
    if phone.len() == 11 && phone.starts_with("09") && phone.chars().all(|c| c.is_ascii_digit()) {
        format!("98{}", &phone[1..])
    } else {
        phone.to_string()
    }
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+").expect("valid mention pattern"))
}

/// Extract distinct `@handle` tokens from free-form message text,
/// first-seen order.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    mention_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_phone_is_rewritten() {
        assert_eq!(normalize_phone_number("09123456789"), "989123456789");
        assert_eq!(normalize_phone_number("09000000000"), "989000000000");
    }

    #[test]
    fn test_non_domestic_phone_passes_through() {
        assert_eq!(normalize_phone_number("+989123456789"), "+989123456789");
        assert_eq!(normalize_phone_number("989123456789"), "989123456789");
        // 11 chars but not all digits
        assert_eq!(normalize_phone_number("0912345678x"), "0912345678x");
        // wrong length
        assert_eq!(normalize_phone_number("0912345678"), "0912345678");
        assert_eq!(normalize_phone_number(""), "");
    }

    #[test]
    fn test_persian_fold_arabic_variants() {
        // Arabic yeh and kaf fold to the Persian letters
        assert_eq!(normalize_persian("\u{064A}\u{0643}"), "\u{06CC}\u{06A9}");
        // alef maksura → Persian yeh, teh marbuta → heh
        assert_eq!(normalize_persian("\u{0649}\u{0629}"), "\u{06CC}\u{0647}");
        // already-Persian text is untouched
        assert_eq!(normalize_persian("سلام"), "سلام");
    }

    #[test]
    fn test_persian_fold_applies_nfkc() {
        // U+FE8E ARABIC LETTER ALEF FINAL FORM is a compatibility glyph of U+0627
        assert_eq!(normalize_persian("\u{FE8E}"), "\u{0627}");
    }

    #[test]
    fn test_extract_mentions_distinct_in_order() {
        let text = "PROMO: @ali @reza_77 text @ali more @mina1";
        assert_eq!(extract_mentions(text), vec!["@ali", "@reza_77", "@mina1"]);
    }

    #[test]
    fn test_extract_mentions_ignores_bare_at() {
        assert!(extract_mentions("no handles @ here").is_empty());
        assert!(extract_mentions("plain text").is_empty());
    }
}
