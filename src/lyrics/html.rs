//! Small helpers over parsed HTML trees, shared by the scraping sources.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

fn anchor_selector() -> &'static Selector {
    static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
    &ANCHOR
}

fn is_invisible(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript")
}

/// All `<a>` elements of the document paired with their `href` values, in
/// document order.
pub fn document_links<'a>(doc: &'a Html) -> impl Iterator<Item = (ElementRef<'a>, &'a str)> {
    doc.select(anchor_selector())
        .filter_map(|a| a.value().attr("href").map(|href| (a, href)))
}

/// Concatenated descendant text with each fragment trimmed, the way a title
/// is printed inside a search-result anchor.
pub fn inline_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Descendant text fragments, trimmed, one per line, with script and style
/// bodies excluded.
pub fn block_text(el: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_fragments(el, &mut fragments);
    fragments.join("\n")
}

fn collect_fragments(el: ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !is_invisible(child_el.value().name()) {
                collect_fragments(child_el, out);
            }
        }
    }
}

/// Walk up from `el` through at most `levels` ancestors and return the text
/// of the first link whose `href` matches `href_re`. The walk stops at the
/// first ancestor containing such a link; search-result rows keep the song
/// link and the artist link under one container, so the nearest match is
/// the right one.
pub fn ancestor_link_text(el: ElementRef<'_>, href_re: &Regex, levels: usize) -> Option<String> {
    let mut cur = el;
    for _ in 0..=levels {
        let found = cur
            .select(anchor_selector())
            .find(|a| a.value().attr("href").is_some_and(|href| href_re.is_match(href)));
        if let Some(link) = found {
            let text = inline_text(link);
            return (!text.is_empty()).then_some(text);
        }
        cur = cur.parent().and_then(ElementRef::wrap)?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_text_joins_trimmed_fragments() {
        let doc = Html::parse_fragment("<a> 夜に駆ける <span>(full)</span> </a>");
        let a = doc
            .select(&Selector::parse("a").unwrap())
            .next()
            .unwrap();
        assert_eq!(inline_text(a), "夜に駆ける(full)");
    }

    #[test]
    fn block_text_skips_script_bodies() {
        let doc = Html::parse_document(
            "<html><body><div>one<script>var x = 1;</script><p>two</p></div></body></html>",
        );
        assert_eq!(block_text(doc.root_element()), "one\ntwo");
    }

    #[test]
    fn ancestor_link_text_finds_the_sibling_artist_link() {
        let doc = Html::parse_document(
            "<html><body><table><tr>\
             <td><a id=\"song\" href=\"/lyrics/42\">Song</a></td>\
             <td><a href=\"/lyrics/artist/7\">Artist Name</a></td>\
             </tr></table></body></html>",
        );
        let song = doc
            .select(&Selector::parse("#song").unwrap())
            .next()
            .unwrap();
        let re = Regex::new("^/lyrics/artist/").unwrap();
        assert_eq!(ancestor_link_text(song, &re, 10).as_deref(), Some("Artist Name"));
        assert_eq!(ancestor_link_text(song, &re, 1), None);
    }
}
