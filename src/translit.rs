//! Latin transliteration for records written in non-Latin scripts.
//!
//! Voter lists are published in Devanagari; transliterating lets a Latin
//! query reach those names when `search.transliterate` is enabled.

use deunicode::deunicode;
use unicode_script::{Script, UnicodeScript};

/// First non-Latin script in a string, if any.
pub fn detect_non_latin_script(s: &str) -> Option<Script> {
    s.chars()
        .map(|c| c.script())
        .find(|script| !matches!(script, Script::Latin | Script::Common | Script::Inherited))
}

/// Transliterate a string to ASCII/Latin.
pub fn transliterate(s: &str) -> String {
    let result = deunicode(s);
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a field value is worth transliterating before matching.
pub fn needs_transliteration(s: &str) -> bool {
    detect_non_latin_script(s).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_non_latin_script() {
        assert_eq!(detect_non_latin_script("Jane Doe"), None);
        assert_eq!(
            detect_non_latin_script("राम पाटील"),
            Some(Script::Devanagari)
        );
        assert_eq!(detect_non_latin_script("12-B"), None);
        assert_eq!(detect_non_latin_script("José"), None);
        assert_eq!(
            detect_non_latin_script("Ram पाटील"),
            Some(Script::Devanagari)
        );
    }

    #[test]
    fn test_transliterate_devanagari() {
        let out = transliterate("राम");
        assert!(!out.is_empty());
        assert!(out.is_ascii(), "got {out}");
        assert_eq!(transliterate("José  García"), "Jose Garcia");
    }

    #[test]
    fn test_needs_transliteration() {
        assert!(!needs_transliteration("Jane Doe"));
        assert!(!needs_transliteration(""));
        assert!(needs_transliteration("राम पाटील"));
    }
}
