//! Language detection (Arabic / English)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the bot answers in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[default]
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Arabic => "Arabic",
            Language::English => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    /// Unknown codes map to English
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "ar" | "arabic" => Language::Arabic,
            _ => Language::English,
        })
    }
}

/// Texts shorter than this (trimmed, in characters) are not analysed
const MIN_DETECTABLE_CHARS: usize = 3;

fn is_arabic_letter(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
        && c.is_alphabetic()
}

/// Detect whether `text` is Arabic or English
///
/// Compares Arabic-script letters against all other letters. Short or
/// letterless input defaults to English.
pub fn detect_language(text: &str) -> Language {
    let text = text.trim();
    if text.chars().count() < MIN_DETECTABLE_CHARS {
        return Language::English;
    }

    let (arabic, other) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(arabic, other), c| {
            if is_arabic_letter(c) {
                (arabic + 1, other)
            } else {
                (arabic, other + 1)
            }
        });

    if arabic > 0 && arabic >= other {
        Language::Arabic
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_arabic() {
        assert_eq!(detect_language("كيف يمكنني حجز سيارة؟"), Language::Arabic);
        assert_eq!(detect_language("السلام عليكم"), Language::Arabic);
    }

    #[test]
    fn test_detect_english() {
        assert_eq!(detect_language("How do I book a taxi?"), Language::English);
        assert_eq!(detect_language("What payment methods do you accept?"), Language::English);
    }

    #[test]
    fn test_short_text_defaults_to_english() {
        assert_eq!(detect_language(""), Language::English);
        assert_eq!(detect_language("  "), Language::English);
        assert_eq!(detect_language("مر"), Language::English);
    }

    #[test]
    fn test_letterless_text_defaults_to_english() {
        assert_eq!(detect_language("12345 ?!"), Language::English);
    }

    #[test]
    fn test_mixed_text_follows_majority() {
        assert_eq!(detect_language("ok شكرا جزيلا لكم"), Language::Arabic);
        assert_eq!(detect_language("thanks a lot for the ride شكرا"), Language::English);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Arabic.code(), "ar");
        assert_eq!(Language::English.to_string(), "en");
        assert_eq!("ar".parse::<Language>().unwrap(), Language::Arabic);
        assert_eq!("fr".parse::<Language>().unwrap(), Language::English);
        assert_eq!(serde_json::to_string(&Language::Arabic).unwrap(), r#""ar""#);
    }
}
