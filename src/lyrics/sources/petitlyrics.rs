//! PetitLyrics scraping source.
//!
//! The site has no API; lyrics are scraped from the song page reached via
//! the public search. Page layouts vary, so extraction is layered: known
//! lyric containers first, then a scan of the section between the bookmark
//! widget and the page footer, then the whole visible text as a last
//! resort. Short extractions are returned as-is; the resolver's usability
//! gate is the judge of whether they count.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::lyrics::html::{ancestor_link_text, block_text, document_links, inline_text};
use crate::lyrics::select::choose_newest;
use crate::lyrics::types::{
    LyricsKind, LyricsResult, SearchHit, SourceError, SourceId, SourceResult,
};
use crate::request::LyricsRequest;

pub const DEFAULT_BASE_URL: &str = "https://petitlyrics.com";

/// Extractions at or below this many characters are assumed to have picked
/// up navigation chrome instead of lyrics.
const MIN_TEXT_CHARS: usize = 30;

/// Song-page links inside search results, `/lyrics/<numeric id>`.
static SONG_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/lyrics/(\d+)$").unwrap());
/// Artist-page links sharing a result row with the song link.
static ARTIST_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/lyrics/artist/").unwrap());
/// Share-widget label sitting right before the lyric block.
static SECTION_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Bookmark this page|☆Bookmark|ブックマーク").unwrap());
/// Labels of the sections that follow the lyric block.
static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Purchase on|Lyrics List For This Artist|Posted By:|URL of this page|このページのURL")
        .unwrap()
});
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Containers that hold the lyric text on most page variants.
static LYRIC_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["#lyrics", ".lyrics", ".lyricsBody", ".lyrics-body", "#lyric", ".lyric"]
        .iter()
        .map(|css| Selector::parse(css).unwrap())
        .collect()
});

#[derive(Debug, Clone)]
pub struct PetitLyrics {
    base_url: String,
    pace: Duration,
}

impl Default for PetitLyrics {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pace: Duration::from_secs(1),
        }
    }
}

impl PetitLyrics {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Delay between consecutive requests to the site.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Search for the requested song, pick the best hit and scrape its
    /// lyric text.
    pub async fn resolve(&self, http: &Client, req: &LyricsRequest) -> SourceResult<LyricsResult> {
        self.warm_up(http).await;

        let search_url = self.search_url(req);
        let html = self.fetch_page(http, &search_url).await?;
        let hits = parse_search_hits(&html, &self.base_url);
        let best = choose_newest(&hits, req.title.as_deref(), req.artist.as_deref())
            .ok_or_else(|| SourceError::NotFound("petitlyrics: no search hits".to_string()))?;

        tokio::time::sleep(self.pace).await;

        let page = self.fetch_page(http, &best.page_url).await?;
        let text = extract_lyric_text(&page);

        let mut metadata = vec![
            ("lyrics_id", best.external_id.clone()),
            ("title", best.title.clone()),
        ];
        if let Some(artist) = &best.artist {
            metadata.push(("artist", artist.clone()));
        }
        metadata.push(("url", best.page_url.clone()));
        metadata.push(("search_url", search_url));

        Ok(LyricsResult {
            source: SourceId::PetitLyrics,
            text,
            kind: LyricsKind::Plain,
            metadata,
            record: None,
        })
    }

    /// Best-effort cookie warm-up mirroring a browser landing on the site;
    /// failures only get logged.
    async fn warm_up(&self, http: &Client) {
        let pause = self.pace.min(Duration::from_millis(300));
        for path in ["/", "/search_lyrics"] {
            let url = format!("{}{}", self.base_url, path);
            if let Err(err) = self.get(http, &url).await {
                tracing::debug!(%url, error = %err, "petitlyrics warm-up request failed");
            }
            tokio::time::sleep(pause).await;
        }
    }

    async fn get(&self, http: &Client, url: &str) -> reqwest::Result<reqwest::Response> {
        http.get(url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(header::REFERER, format!("{}/search_lyrics", self.base_url))
            .send()
            .await
    }

    /// GET a page, treating a redirect onto the site's 404 page as missing.
    async fn fetch_page(&self, http: &Client, url: &str) -> SourceResult<String> {
        let resp = self.get(http, url).await?;
        if resp.url().path().ends_with("/404.php") {
            return Err(SourceError::NotFound(format!(
                "petitlyrics: {url} redirected to the 404 page"
            )));
        }
        Ok(resp.error_for_status()?.text().await?)
    }

    fn search_url(&self, req: &LyricsRequest) -> String {
        format!(
            "{}/search_lyrics?title={}&title_opt=&artist={}&artist_opt=",
            self.base_url,
            urlencoding::encode(req.title.as_deref().unwrap_or("")),
            urlencoding::encode(req.artist.as_deref().unwrap_or("")),
        )
    }
}

/// Collect song links out of a search-result page, one hit per lyric id,
/// recovering the artist from the surrounding result row.
fn parse_search_hits(html: &str, base_url: &str) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for (anchor, href) in document_links(&doc) {
        let Some(captures) = SONG_LINK_RE.captures(href) else {
            continue;
        };
        let id = captures[1].to_string();
        if !seen.insert(id.clone()) {
            continue;
        }
        hits.push(SearchHit {
            source: SourceId::PetitLyrics,
            title: inline_text(anchor),
            artist: ancestor_link_text(anchor, &ARTIST_LINK_RE, 10),
            page_url: format!("{base_url}{href}"),
            external_id: id,
        });
    }
    hits
}

/// Layered extraction: known containers, then the bookmark-to-footer scan,
/// then the entire visible document.
fn extract_lyric_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    for selector in LYRIC_CONTAINERS.iter() {
        if let Some(container) = doc.select(selector).next() {
            let text = block_text(container);
            if text.chars().count() > MIN_TEXT_CHARS {
                return text;
            }
        }
    }

    if let Some(text) = bookmark_section_text(&doc)
        && text.chars().count() > MIN_TEXT_CHARS
    {
        return text;
    }

    block_text(doc.root_element())
}

/// Text fragments between the bookmark widget and the first footer label,
/// in document order.
fn bookmark_section_text(doc: &Html) -> Option<String> {
    let mut scan = SectionScan::default();
    scan_section(doc.root_element(), &mut scan);
    if !scan.started {
        return None;
    }
    let joined = scan.chunks.join("\n");
    Some(BLANK_RUN_RE.replace_all(joined.trim(), "\n\n").to_string())
}

#[derive(Default)]
struct SectionScan {
    started: bool,
    done: bool,
    chunks: Vec<String>,
}

fn scan_section(el: ElementRef<'_>, scan: &mut SectionScan) {
    for child in el.children() {
        if scan.done {
            return;
        }
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !scan.started {
                if SECTION_START_RE.is_match(trimmed) {
                    scan.started = true;
                }
                continue;
            }
            if SECTION_END_RE.is_match(trimmed) {
                scan.done = true;
                return;
            }
            // Share buttons and navigation labels interleaved with the text.
            if matches!(trimmed, "Tweet" | "TOP" | "Lyric Search" | "歌詞検索") {
                continue;
            }
            scan.chunks.push(trimmed.to_string());
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !matches!(child_el.value().name(), "script" | "style" | "noscript") {
                scan_section(child_el, scan);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_are_deduplicated_by_lyric_id() {
        let html = r#"<html><body><table>
            <tr><td><a href="/lyrics/101">踊</a></td>
                <td><a href="/lyrics/artist/9">Ado</a></td></tr>
            <tr><td><a href="/lyrics/101">踊</a></td></tr>
            <tr><td><a href="/lyrics/205">うっせぇわ</a></td>
                <td><a href="/lyrics/artist/9">Ado</a></td></tr>
            <tr><td><a href="/lyrics/abc">not numeric</a></td></tr>
            </table></body></html>"#;
        let hits = parse_search_hits(html, "https://petitlyrics.com");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].external_id, "101");
        assert_eq!(hits[0].title, "踊");
        assert_eq!(hits[0].artist.as_deref(), Some("Ado"));
        assert_eq!(hits[0].page_url, "https://petitlyrics.com/lyrics/101");
        assert_eq!(hits[1].external_id, "205");
    }

    #[test]
    fn container_extraction_wins_when_long_enough() {
        let html = r#"<html><body>
            <div id="lyrics">ここから歌詞が始まる<br>夜の街をひとり歩いて<br>君のことを想うだけ<br>朝が来るまで踊り続けて</div>
            <div>ブックマーク</div><div>このテキストは候補にならない</div>
            </body></html>"#;
        let text = extract_lyric_text(html);
        assert_eq!(
            text,
            "ここから歌詞が始まる\n夜の街をひとり歩いて\n君のことを想うだけ\n朝が来るまで踊り続けて"
        );
    }

    #[test]
    fn bookmark_section_scan_collects_between_landmarks() {
        let html = r#"<html><body>
            <div class="nav">ブックマーク</div>
            <div>Tweet</div>
            <div class="text">遠く霞む空の下で<br>いつかの歌を口ずさむ<br>帰り道はもう無いけれど</div>
            <div>Lyrics List For This Artist</div>
            <div>この後のテキストは入らない</div>
            </body></html>"#;
        let text = extract_lyric_text(html);
        assert_eq!(text, "遠く霞む空の下で\nいつかの歌を口ずさむ\n帰り道はもう無いけれど");
    }

    #[test]
    fn short_pages_fall_through_to_full_visible_text() {
        let html = "<html><body><p>みじかい</p></body></html>";
        assert_eq!(extract_lyric_text(html), "みじかい");
    }

    #[test]
    fn scripts_never_leak_into_the_fallback_dump() {
        let html = r#"<html><body><p>words</p><script>var a = "hidden";</script></body></html>"#;
        assert_eq!(extract_lyric_text(html), "words");
    }
}
