use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Identifies one of the lyric sources tried by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Captions,
    LrcLib,
    PetitLyrics,
    UtaTen,
}

impl SourceId {
    /// Fixed resolution order: captions, then the lyric database, then the
    /// scraped sites.
    pub const CASCADE: [SourceId; 4] = [
        SourceId::Captions,
        SourceId::LrcLib,
        SourceId::PetitLyrics,
        SourceId::UtaTen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Captions => "captions",
            SourceId::LrcLib => "lrclib",
            SourceId::PetitLyrics => "petitlyrics",
            SourceId::UtaTen => "utaten",
        }
    }

    /// Human-readable label used in the report.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::Captions => "auto-generated captions",
            SourceId::LrcLib => "external lyrics database",
            SourceId::PetitLyrics => "PetitLyrics",
            SourceId::UtaTen => "UtaTen",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row parsed out of a site's search results. Ephemeral: lives only
/// between the search and the detail fetch of a single resolution.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub source: SourceId,
    /// Site-local identifier: a numeric lyric id for PetitLyrics, the song
    /// path for UtaTen. Unique per source within one result page.
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub page_url: String,
}

/// What the external database had on file for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsKind {
    /// Time-synced lyrics were available.
    Synced,
    /// Plain text only.
    Plain,
    /// A record exists but carries no lyric text at all.
    Empty,
}

/// A cleaned lyric result from one source.
#[derive(Debug, Clone)]
pub struct LyricsResult {
    pub source: SourceId,
    /// Plain multi-line text: no markup, no timing tags, no reading glosses.
    pub text: String,
    pub kind: LyricsKind,
    /// Ordered reference details for the report ("url", "search_url", ...).
    pub metadata: Vec<(&'static str, String)>,
    /// Raw record as returned by the database source, kept for the report.
    pub record: Option<Value>,
}

impl LyricsResult {
    /// Canonical page URL for this result, when the source had one.
    pub fn url(&self) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(key, _)| *key == "url")
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
