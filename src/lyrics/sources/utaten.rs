//! UtaTen scraping source.
//!
//! UtaTen prints furigana readings between the kanji of every line and
//! appends a full romaji transliteration below the lyrics, so extraction
//! here is mostly about throwing text away: reading glosses token by
//! token, then everything from the first romanized line on.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header;
use reqwest::Client;
use scraper::{ElementRef, Html};

use crate::lyrics::html::{ancestor_link_text, document_links, inline_text};
use crate::lyrics::jp;
use crate::lyrics::select::choose_closest_length;
use crate::lyrics::types::{
    LyricsKind, LyricsResult, SearchHit, SourceError, SourceId, SourceResult,
};
use crate::request::LyricsRequest;

pub const DEFAULT_BASE_URL: &str = "https://utaten.com";

/// Anything shorter is a failed extraction; real songs clear this easily.
const MIN_TEXT_CHARS: usize = 50;

/// Reading glosses longer than this keep their token; no furigana run for a
/// single word is that long.
const MAX_GLOSS_CHARS: usize = 12;

/// Song-page links inside search results, `/lyric/<slug>/...`.
static SONG_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/lyric/[^/]+/").unwrap());
/// Artist-page links sharing a result row with the song link.
static ARTIST_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/artist/\d+/").unwrap());
/// Footer sections that follow the lyric block.
static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)この歌詞へのご意見|みんなのレビュー|レビューを投稿|ブログやHPでこの歌詞を共有|UtaTenはreCAPTCHA|歌詞検索UtaTen",
    )
    .unwrap()
});
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Display-settings toggles rendered right before the lyric body, in
/// preference order; the newer layout has the dark-mode toggle, older ones
/// only the furigana toggle.
const LANDMARKS: [&str; 2] = ["ダークモード", "ふりがな"];

/// Control labels that survive into the scanned text as whole lines.
const JUNK_LINES: [&str; 6] = ["文字サイズ", "ふりがな", "ダークモード", "歌詞検索", "マイページ", "歌詞"];

#[derive(Debug, Clone)]
pub struct UtaTen {
    base_url: String,
    pace: Duration,
}

impl Default for UtaTen {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pace: Duration::from_secs(1),
        }
    }
}

impl UtaTen {
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
        let best = choose_closest_length(&hits, req.title.as_deref(), req.artist.as_deref())
            .ok_or_else(|| SourceError::NotFound("utaten: no search hits".to_string()))?;

        tokio::time::sleep(self.pace).await;

        let page = self.fetch_page(http, &best.page_url).await?;
        let text = extract_lyric_text(&page).unwrap_or_default();
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(SourceError::Parse(format!(
                "utaten: extraction from {} produced too little text",
                best.page_url
            )));
        }

        let mut metadata = vec![("url", best.page_url.clone()), ("title", best.title.clone())];
        if let Some(artist) = &best.artist {
            metadata.push(("artist", artist.clone()));
        }
        metadata.push(("search_url", search_url));

        Ok(LyricsResult {
            source: SourceId::UtaTen,
            text,
            kind: LyricsKind::Plain,
            metadata,
            record: None,
        })
    }

    /// Best-effort cookie warm-up; failures only get logged.
    async fn warm_up(&self, http: &Client) {
        let pause = self.pace.min(Duration::from_millis(300));
        for path in ["/", "/search"] {
            let url = format!("{}{}", self.base_url, path);
            if let Err(err) = self.get(http, &url).await {
                tracing::debug!(%url, error = %err, "utaten warm-up request failed");
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
            .header(header::REFERER, format!("{}/search", self.base_url))
            .send()
            .await
    }

    async fn fetch_page(&self, http: &Client, url: &str) -> SourceResult<String> {
        let resp = self.get(http, url).await?;
        Ok(resp.error_for_status()?.text().await?)
    }

    fn search_url(&self, req: &LyricsRequest) -> String {
        format!(
            "{}/search?sort=popular_sort_asc&artist_name={}&title={}",
            self.base_url,
            urlencoding::encode(req.artist.as_deref().unwrap_or("")),
            urlencoding::encode(req.title.as_deref().unwrap_or("")),
        )
    }
}

/// Collect song links out of a search-result page, one hit per song path,
/// recovering the artist from the surrounding result row.
fn parse_search_hits(html: &str, base_url: &str) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for (anchor, href) in document_links(&doc) {
        if !SONG_LINK_RE.is_match(href) {
            continue;
        }
        if !seen.insert(href.to_string()) {
            continue;
        }
        let title = inline_text(anchor);
        if title.is_empty() {
            continue;
        }
        hits.push(SearchHit {
            source: SourceId::UtaTen,
            external_id: href.to_string(),
            title,
            artist: ancestor_link_text(anchor, &ARTIST_LINK_RE, 12),
            page_url: format!("{base_url}{href}"),
        });
    }
    hits
}

/// Lyric text between the display-settings toggles and the review footer,
/// with reading glosses and romanized lines removed. `None` when no
/// landmark is present, which happens on error pages and layout changes.
fn extract_lyric_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let raw = LANDMARKS.into_iter().find_map(|landmark| {
        let mut scan = LyricScan::new();
        scan_lyric_section(doc.root_element(), landmark, &mut scan);
        scan.started.then_some(scan.buf)
    })?;

    let mut lines = Vec::new();
    for line in raw.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if JUNK_LINES.contains(&line) {
            continue;
        }
        // The romaji transliteration follows the lyrics; nothing after its
        // first line is lyric text.
        if jp::latin_heavy(line) {
            break;
        }
        let cleaned = strip_reading_glosses(line);
        if cleaned.is_empty() {
            continue;
        }
        if cleaned.chars().count() <= 2 && !jp::has_japanese(&cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    let joined = lines.join("\n");
    Some(BLANK_RUN_RE.replace_all(joined.trim(), "\n\n").to_string())
}

/// Drop inline reading glosses from one display line: all-latin romaji
/// tokens, and short kana-only tokens directly after a kanji-bearing token
/// (the furigana for it). Survivors are joined without separators, the way
/// the line is displayed.
fn strip_reading_glosses(line: &str) -> String {
    let collapsed = WS_RUN_RE.replace_all(line, " ");
    let mut kept: Vec<&str> = Vec::new();
    let mut prev_had_kanji = false;
    for token in collapsed.trim().split(' ') {
        if token.is_empty() {
            continue;
        }
        if jp::is_latin_only(token) {
            prev_had_kanji = false;
            continue;
        }
        if prev_had_kanji && jp::is_kana_only(token) && token.chars().count() <= MAX_GLOSS_CHARS {
            prev_had_kanji = false;
            continue;
        }
        kept.push(token);
        prev_had_kanji = jp::has_kanji(token);
    }
    kept.concat()
}

struct LyricScan {
    started: bool,
    done: bool,
    buf: String,
    at_line_start: bool,
}

impl LyricScan {
    fn new() -> Self {
        Self {
            started: false,
            done: false,
            buf: String::new(),
            at_line_start: true,
        }
    }

    fn push_fragment(&mut self, raw: &str) {
        let collapsed = WS_RUN_RE.replace_all(raw, " ");
        let fragment = collapsed.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.at_line_start {
            self.buf.push(' ');
        }
        self.buf.push_str(fragment);
        self.at_line_start = false;
    }

    fn push_break(&mut self) {
        self.buf.push('\n');
        self.at_line_start = true;
    }
}

fn scan_lyric_section(el: ElementRef<'_>, landmark: &str, scan: &mut LyricScan) {
    for child in el.children() {
        if scan.done {
            return;
        }
        if let Some(text) = child.value().as_text() {
            if !scan.started {
                if text.contains(landmark) {
                    scan.started = true;
                }
                continue;
            }
            if SECTION_END_RE.is_match(text) {
                scan.done = true;
                return;
            }
            scan.push_fragment(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            match child_el.value().name() {
                "br" => {
                    if scan.started {
                        scan.push_break();
                    }
                }
                "script" | "style" | "noscript" => {}
                _ => scan_lyric_section(child_el, landmark, scan),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn furigana_tokens_after_kanji_are_dropped() {
        assert_eq!(strip_reading_glosses("昨日人 きのうひと を 殺 ころ したんだ"), "昨日人を殺したんだ");
        // A second kana token after the gloss is lyric text, not furigana.
        assert_eq!(strip_reading_glosses("空 そら を とぶ"), "空をとぶ");
    }

    #[test]
    fn romaji_tokens_are_dropped_anywhere() {
        assert_eq!(strip_reading_glosses("kinou 昨日 hito"), "昨日");
        assert_eq!(strip_reading_glosses("la la la"), "");
    }

    #[test]
    fn long_kana_runs_survive_after_kanji() {
        let line = "夢 みないふりをしてごまかして";
        assert_eq!(strip_reading_glosses(line), "夢みないふりをしてごまかして");
    }

    #[test]
    fn hits_skip_empty_titles_and_duplicate_urls() {
        // The image-only anchor claims the dedupe slot for its URL, so the
        // titled duplicate below it is dropped with it.
        let html = r#"<html><body>
            <div><a href="/lyric/ado/odo/"><img src="x.png"></a></div>
            <div><a href="/lyric/ado/odo/">踊</a></div>
            <div><a href="/lyric/eve/kaikai/">廻廻奇譚</a></div>
            </body></html>"#;
        let hits = parse_search_hits(html, "https://utaten.com");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, "/lyric/eve/kaikai/");
        assert_eq!(hits[0].title, "廻廻奇譚");
        assert_eq!(hits[0].artist, None);
        assert_eq!(hits[0].page_url, "https://utaten.com/lyric/eve/kaikai/");
    }

    #[test]
    fn artist_comes_from_the_nearest_result_row() {
        let html = r#"<html><body><ul>
            <li><a href="/lyric/yoasobi/yoru/">夜に駆ける</a> <a href="/artist/101/">YOASOBI</a></li>
            <li><a href="/lyric/ado/usseewa/">うっせぇわ</a> <a href="/artist/9/">Ado</a></li>
            </ul></body></html>"#;
        let hits = parse_search_hits(html, "https://utaten.com");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].artist.as_deref(), Some("YOASOBI"));
        assert_eq!(hits[1].artist.as_deref(), Some("Ado"));
    }

    #[test]
    fn extraction_scans_between_landmark_and_footer() {
        let html = r#"<html><body>
            <div class="toggles">ふりがな ダークモード</div>
            <div class="lyricBody">昨日人 きのうひと を 殺 ころ したんだ<br>それでも空は青かった<br>歌詞</div>
            <div>この歌詞へのご意見</div>
            <div>ここは読まれない</div>
            </body></html>"#;
        let text = extract_lyric_text(html).unwrap();
        assert_eq!(text, "昨日人を殺したんだ\nそれでも空は青かった");
    }

    #[test]
    fn romanized_block_truncates_everything_after_it() {
        let html = r#"<html><body>
            <span>ダークモード</span>
            <div>夜の向こうへ歩き出す<br>kinou hito wo koroshitanda yo<br>この行は捨てられる</div>
            <div>みんなのレビュー</div>
            </body></html>"#;
        let text = extract_lyric_text(html).unwrap();
        assert_eq!(text, "夜の向こうへ歩き出す");
    }

    #[test]
    fn missing_landmark_means_no_extraction() {
        let html = "<html><body><div>ただのページ</div></body></html>";
        assert_eq!(extract_lyric_text(html), None);
    }
}
