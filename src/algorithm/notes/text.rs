//! Note text normalization

use regex::Regex;

use crate::error::Result;

/// Ordered substitutions applied after lowercasing
const SUBSTITUTIONS: [(&str, &str); 7] = [
    (r"\[(.*?)\]", ""),
    (r"[0-9]+\.", ""),
    (r"dr\.", "doctor"),
    (r"m\.d\.", "md"),
    (r"admission date:", ""),
    (r"discharge date:", ""),
    (r"--|__|==", ""),
];

/// Normalizes raw note text before chunking
#[derive(Debug, Clone)]
pub struct NoteCleaner {
    substitutions: Vec<(Regex, &'static str)>,
}

impl NoteCleaner {
    /// Compile the substitution patterns
    pub fn new() -> Result<Self> {
        let substitutions = SUBSTITUTIONS
            .iter()
            .map(|&(pattern, replacement)| Ok((Regex::new(pattern)?, replacement)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { substitutions })
    }

    /// Clean one note
    ///
    /// Missing text becomes a single space. Line breaks turn into spaces, the
    /// text is trimmed and lowercased, then bracketed de-identification
    /// placeholders, list numbering, date headers and separator runs are
    /// removed and the `dr.`/`m.d.` abbreviations expanded.
    #[must_use]
    pub fn clean(&self, text: Option<&str>) -> String {
        let Some(text) = text else {
            return " ".to_string();
        };
        let mut cleaned = text
            .replace(['\n', '\r'], " ")
            .trim()
            .to_lowercase();
        for (pattern, replacement) in &self.substitutions {
            cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
        }
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_placeholders_and_headers() {
        let cleaner = NoteCleaner::new().unwrap();
        let raw = "Admission Date: [**2150-1-1**]\nDischarge Date: [**2150-1-5**]\r\n\
                   1. Seen by Dr. Smith M.D. ---- ok";
        assert_eq!(
            cleaner.clean(Some(raw)),
            "      seen by doctor smith md  ok"
        );
    }

    #[test]
    fn test_clean_missing_text() {
        let cleaner = NoteCleaner::new().unwrap();
        assert_eq!(cleaner.clean(None), " ");
        assert_eq!(cleaner.clean(Some("  Plain\nTEXT  ")), "plain text");
    }

    #[test]
    fn test_numbers_without_dot_survive() {
        let cleaner = NoteCleaner::new().unwrap();
        assert_eq!(cleaner.clean(Some("bp 120/80. hr 72")), "bp 120/ hr 72");
    }
}
