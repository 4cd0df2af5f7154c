//! Comparison keys for matching requested titles and artists against
//! scraped search hits.

/// Punctuation stripped from comparison keys, half- and full-width variants.
const STRIPPED: &[char] = &[
    '"', '\'', '’', '`', '“', '”', '(', ')', '[', ']', '{', '}', '<', '>', '【', '】', '（', '）',
    '［', '］', '｛', '｝', '・', '/', '\\', '-', '–', '—', ':', '：', ',', '，', '.', '。', '!',
    '！', '?', '？', '~', '〜',
];

/// Reduce a title or artist name to a key for fuzzy equality checks.
///
/// Absent input yields the empty key. Otherwise the text is lowercased and
/// every whitespace character (the ideographic space included) and every
/// character in [`STRIPPED`] is removed. Keys are only ever compared, never
/// displayed.
pub fn comparison_key(text: Option<&str>) -> String {
    let Some(raw) = text else {
        return String::new();
    };
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED.contains(c))
        .collect()
}
