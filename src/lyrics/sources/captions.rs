//! Caption source: auto-generated subtitle tracks from the video platform.

use reqwest::{Client, StatusCode};

use crate::lyrics::srt;
use crate::lyrics::types::{LyricsKind, LyricsResult, SourceError, SourceId, SourceResult};
use crate::request::LyricsRequest;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Caption languages probed in order; the catalogue is Japanese-first.
const LANGUAGES: [&str; 2] = ["ja", "en"];

#[derive(Debug, Clone)]
pub struct Captions {
    base_url: String,
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Captions {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the first caption track that cleans down to non-empty lyric
    /// text. Missing tracks (404) and empty tracks move on to the next
    /// language.
    pub async fn resolve(&self, http: &Client, req: &LyricsRequest) -> SourceResult<LyricsResult> {
        let video_id = req
            .video_id
            .as_deref()
            .ok_or_else(|| SourceError::NotFound("captions: request has no video id".to_string()))?;

        for lang in LANGUAGES {
            let url = format!(
                "{}/api/timedtext?v={}&lang={}&fmt=srt",
                self.base_url,
                urlencoding::encode(video_id),
                lang
            );
            let resp = http.get(&url).send().await?;
            if resp.status() == StatusCode::NOT_FOUND {
                continue;
            }
            let body = resp.error_for_status()?.text().await?;
            let text = srt::to_lyric_text(&body);
            if text.is_empty() {
                continue;
            }

            let mut metadata = vec![
                ("video_id", video_id.to_string()),
                ("url", format!("{}/watch?v={}", self.base_url, video_id)),
            ];
            if let Some(artist) = &req.artist {
                metadata.push(("artist", artist.clone()));
            }
            if let Some(title) = &req.title {
                metadata.push(("title", title.clone()));
            }
            return Ok(LyricsResult {
                source: SourceId::Captions,
                text,
                kind: LyricsKind::Plain,
                metadata,
                record: None,
            });
        }
        Err(SourceError::NotFound(format!(
            "captions: no usable caption track for video {video_id}"
        )))
    }
}
