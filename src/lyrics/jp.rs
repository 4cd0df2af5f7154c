//! Japanese script tests backing the UtaTen cleaning pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of two or more latin letters. Single letters inside Japanese text
/// do not count toward the romanized-block heuristic.
static LATIN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{2,}").unwrap());

fn is_kanji(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Hiragana and katakana, including the long-vowel and voicing marks.
fn is_kana(c: char) -> bool {
    ('\u{3040}'..='\u{30ff}').contains(&c)
}

pub fn has_kanji(s: &str) -> bool {
    s.chars().any(is_kanji)
}

pub fn has_japanese(s: &str) -> bool {
    s.chars().any(|c| is_kana(c) || is_kanji(c))
}

/// True for non-empty tokens made entirely of kana; these are the candidate
/// reading glosses.
pub fn is_kana_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_kana)
}

/// True for non-empty tokens made entirely of ASCII letters.
pub fn is_latin_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// A line dominated by latin runs marks the start of a romanized block:
/// at least four runs totaling at least twelve letters.
pub fn latin_heavy(line: &str) -> bool {
    let mut runs = 0usize;
    let mut letters = 0usize;
    for m in LATIN_RUN.find_iter(line) {
        runs += 1;
        letters += m.as_str().len();
    }
    runs >= 4 && letters >= 12
}
