//! External lyrics database source (lrclib.net).

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::lyrics::types::{LyricsKind, LyricsResult, SourceError, SourceId, SourceResult};
use crate::request::LyricsRequest;

pub const DEFAULT_BASE_URL: &str = "https://lrclib.net";

/// Inline LRC timestamp tags, `[mm:ss.xx]`.
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,2}:\d{2}[.]\d{1,2}\]").unwrap());

/// The fields of a search record this source acts on; the full record is
/// kept alongside as raw JSON.
#[derive(Debug, Deserialize, Default)]
#[allow(non_snake_case)]
struct DbRecord {
    trackName: Option<String>,
    artistName: Option<String>,
    plainLyrics: Option<String>,
    syncedLyrics: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LrcLib {
    base_url: String,
}

impl Default for LrcLib {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl LrcLib {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search the database and classify the best record. A record is
    /// returned even when it carries no lyric text; the caller decides what
    /// an empty record means.
    pub async fn resolve(&self, http: &Client, req: &LyricsRequest) -> SourceResult<LyricsResult> {
        if !req.has_search_terms() {
            return Err(SourceError::NotFound(
                "lrclib: request has neither title nor artist".to_string(),
            ));
        }

        let search_url = build_search_url(&self.base_url, req);
        let resp = http.get(&search_url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(
                "lrclib: search endpoint returned 404".to_string(),
            ));
        }
        let body = resp.error_for_status()?.text().await?;
        let records: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("lrclib: unexpected search payload: {e}")))?;
        if records.is_empty() {
            return Err(SourceError::NotFound(
                "lrclib: no records matched the search".to_string(),
            ));
        }

        let raw = best_record(&records, req.title.as_deref());
        let record: DbRecord = serde_json::from_value(raw.clone()).unwrap_or_default();

        let plain = record.plainLyrics.as_deref().unwrap_or("").trim();
        let synced = record.syncedLyrics.as_deref().unwrap_or("").trim();
        let (kind, text) = if !synced.is_empty() {
            let text = if plain.is_empty() {
                strip_timestamps(synced)
            } else {
                plain.to_string()
            };
            (LyricsKind::Synced, text)
        } else if !plain.is_empty() {
            (LyricsKind::Plain, plain.to_string())
        } else {
            (LyricsKind::Empty, String::new())
        };

        let mut metadata = Vec::new();
        if let Some(track) = &record.trackName {
            metadata.push(("track", track.clone()));
        }
        if let Some(artist) = &record.artistName {
            metadata.push(("artist", artist.clone()));
        }
        metadata.push(("search_url", search_url));

        Ok(LyricsResult {
            source: SourceId::LrcLib,
            text,
            kind,
            metadata,
            record: Some(raw.clone()),
        })
    }
}

fn build_search_url(base_url: &str, req: &LyricsRequest) -> String {
    let mut params = Vec::new();
    if let Some(title) = &req.title {
        params.push(format!("track_name={}", urlencoding::encode(title)));
    }
    if let Some(artist) = &req.artist {
        params.push(format!("artist_name={}", urlencoding::encode(artist)));
    }
    format!("{}/api/search?{}", base_url, params.join("&"))
}

/// First record whose track name equals the requested title, compared
/// case-insensitively after trimming; falls back to the first record.
fn best_record<'a>(records: &'a [Value], title: Option<&str>) -> &'a Value {
    if let Some(title) = title {
        let want = title.trim().to_lowercase();
        for rec in records {
            let name = rec.get("trackName").and_then(Value::as_str).unwrap_or("");
            if name.trim().to_lowercase() == want {
                return rec;
            }
        }
    }
    &records[0]
}

/// Plain text out of a synced lyric body: timestamp tags removed, blank
/// lines dropped.
fn strip_timestamps(synced: &str) -> String {
    let mut lines = Vec::new();
    for line in synced.lines() {
        let stripped = TIMESTAMP_RE.replace_all(line, "");
        let trimmed = stripped.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_and_blank_lines_are_stripped() {
        let synced = "[00:12.34] 夜を駆ける\n[00:15.00]\n[01:02.50] 君の手を引く";
        assert_eq!(strip_timestamps(synced), "夜を駆ける\n君の手を引く");
    }

    #[test]
    fn search_url_includes_only_present_fields() {
        let both = LyricsRequest::new(Some("Ado".into()), Some("踊 (Remix)".into()), None);
        assert_eq!(
            build_search_url("https://lrclib.net", &both),
            "https://lrclib.net/api/search?track_name=%E8%B8%8A%20%28Remix%29&artist_name=Ado"
        );
        let title_only = LyricsRequest::new(None, Some("踊".into()), None);
        assert_eq!(
            build_search_url("https://lrclib.net", &title_only),
            "https://lrclib.net/api/search?track_name=%E8%B8%8A"
        );
    }

    #[test]
    fn best_record_prefers_the_exact_track_name() {
        let records = vec![
            serde_json::json!({"trackName": "Odo (Cover)", "id": 1}),
            serde_json::json!({"trackName": " ODO ", "id": 2}),
        ];
        let best = best_record(&records, Some("odo"));
        assert_eq!(best.get("id").and_then(Value::as_i64), Some(2));
        let fallback = best_record(&records, Some("unrelated"));
        assert_eq!(fallback.get("id").and_then(Value::as_i64), Some(1));
    }
}
