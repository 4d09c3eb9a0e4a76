//! Script-based language classification

use crate::state::Language;

/// Share of Hangul letters at or above which a page is Korean
const KOREAN_THRESHOLD: f64 = 0.7;

/// Share of Hangul letters above which a page is mixed Korean/English
const MIXED_THRESHOLD: f64 = 0.1;

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'   // syllables
        | '\u{1100}'..='\u{11FF}' // jamo
        | '\u{3130}'..='\u{318F}' // compatibility jamo
        | '\u{A960}'..='\u{A97F}'
        | '\u{D7B0}'..='\u{D7FF}')
}

/// Classifies text by the share of Hangul among Hangul and Latin letters
///
/// Digits, punctuation and other scripts are ignored.
///
/// # Examples
///
/// ```
/// use portal_scout::crawler::detect_language;
/// use portal_scout::state::Language;
///
/// assert_eq!(detect_language("민원 안내"), Language::Korean);
/// assert_eq!(detect_language("Civil petitions"), Language::English);
/// assert_eq!(detect_language("2024. 01. 02."), Language::Unknown);
/// ```
pub fn detect_language(text: &str) -> Language {
    let mut hangul = 0usize;
    let mut latin = 0usize;

    for c in text.chars() {
        if is_hangul(c) {
            hangul += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    let total = hangul + latin;
    if total == 0 {
        return Language::Unknown;
    }

    let share = hangul as f64 / total as f64;
    if share >= KOREAN_THRESHOLD {
        Language::Korean
    } else if share > MIXED_THRESHOLD {
        Language::Mixed
    } else {
        Language::English
    }
}
