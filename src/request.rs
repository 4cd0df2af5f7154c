//! What the user asked for: artist, title and an optional video id, either
//! given directly or parsed out of an issue-style request body.

use once_cell::sync::Lazy;
use regex::Regex;

/// First non-empty line of a request body, split as "Artist - Title".
static ARTIST_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s*-\s*(.+)$").unwrap());
/// Watch-page and short-form video URLs anywhere in the body.
static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([0-9A-Za-z_-]{8,})")
        .unwrap()
});
/// Fallback: a labelled bare id, e.g. "動画ID: abc123XYZ_-".
static VIDEO_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)動画ID[^0-9A-Za-z_-]*([0-9A-Za-z_-]{8,})").unwrap());

/// A lyrics lookup request. Fields that are present are trimmed and
/// non-empty; blank input is stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricsRequest {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub video_id: Option<String>,
}

impl LyricsRequest {
    pub fn new(artist: Option<String>, title: Option<String>, video_id: Option<String>) -> Self {
        Self {
            artist: clean(artist),
            title: clean(title),
            video_id: clean(video_id),
        }
    }

    /// True when the request carries at least one searchable field.
    pub fn has_search_terms(&self) -> bool {
        self.artist.is_some() || self.title.is_some()
    }
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an issue-style request body.
///
/// The first non-empty line is taken as "Artist - Title" when it contains a
/// dash separator. The video id comes from the first video URL anywhere in
/// the body, or failing that from a labelled bare id. Every field is
/// optional; an unparseable body yields an empty request.
pub fn parse_issue_body(body: &str) -> LyricsRequest {
    let mut artist = None;
    let mut title = None;
    if let Some(line) = body.lines().map(str::trim).find(|line| !line.is_empty())
        && let Some(captures) = ARTIST_TITLE_RE.captures(line)
    {
        artist = Some(captures[1].to_string());
        title = Some(captures[2].to_string());
    }

    let video_id = VIDEO_URL_RE
        .captures(body)
        .or_else(|| VIDEO_LABEL_RE.captures(body))
        .map(|captures| captures[1].to_string());

    LyricsRequest::new(artist, title, video_id)
}
