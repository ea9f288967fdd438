//! Text normalization for quote matching
//!
//! Translation text from the lookup service carries footnote tags, verse
//! numbers and transliteration diacritics that LLM quotes never reproduce.
//! [`normalize`] reduces both sides to the same plain ASCII form.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<sup\b[^>]*>.*?</sup>").expect("static regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static IE_GLOSS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[i\.e\..*?\]").expect("static regex"));

/// Macroned vowels, mapped to plain vowels
const TRANSLITERATION: [(char, char); 6] = [
    ('ā', 'a'),
    ('ī', 'i'),
    ('ū', 'u'),
    ('Ā', 'A'),
    ('Ī', 'I'),
    ('Ū', 'U'),
];

/// Normalize text for comparison.
///
/// Removes `<sup>` footnotes and other markup tags, standalone digit runs,
/// `[i.e. ...]` glosses and diacritics, collapses whitespace and returns
/// ASCII only. Idempotent.
///
/// ```
/// use mizan_citations::normalize;
///
/// assert_eq!(normalize("<sup>1</sup> Qur'ān  2 says"), "Qur'an says");
/// ```
pub fn normalize(text: &str) -> String {
    let mut current = pass(text);
    // Later passes see ASCII only and can only shorten the text.
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn pass(text: &str) -> String {
    let text = FOOTNOTE.replace_all(text, "");
    let text = TAG.replace_all(&text, "");
    let text = strip_standalone_digits(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = IE_GLOSS.replace_all(text.trim(), "");

    text.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .map(|c| {
            TRANSLITERATION
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .filter(char::is_ascii)
        .collect()
}

fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Drop runs of ASCII digits not attached to a word character on either side
fn strip_standalone_digits(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let before = start.checked_sub(1).map(|j| chars[j]);
        let after = chars.get(i).copied();
        let embedded = before.is_some_and(is_ascii_word) || after.is_some_and(is_ascii_word);
        if embedded {
            out.extend(&chars[start..i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_footnotes() {
        let raw = "Guide us to the straight path<sup foot_note=77>1</sup>";
        assert_eq!(normalize(raw), "Guide us to the straight path");
    }

    #[test]
    fn test_removes_diacritics() {
        let out = normalize("Qur'ān, Raḥmān, ʿĪsā");
        assert!(out.is_ascii());
        assert!(out.contains("Qur'an"));
        assert!(out.contains("Rahman"));
    }

    #[test]
    fn test_standalone_digits_only() {
        assert_eq!(normalize("verse 5 of 2b and x3"), "verse of 2b and x3");
        assert_eq!(normalize("12 34"), "");
    }

    #[test]
    fn test_ie_gloss_removed() {
        assert_eq!(normalize("He [i.e. Allah] is the Most Merciful"), "He is the Most Merciful");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("  a\t\tb \n c  "), "a b c");
    }

    #[test]
    fn test_idempotent_on_gloss_leftovers() {
        let raw = "x [i.e. y] 7 z";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("<b></b>"), "");
    }

    #[test]
    fn test_plain_tags_keep_content() {
        assert_eq!(normalize("the <i>Rahman</i>."), "the Rahman.");
    }
}
