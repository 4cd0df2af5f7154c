//! Runs the source cascade for a request and records what happened at each
//! step.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;

use crate::lyrics::sources::{Captions, LrcLib, PetitLyrics, UtaTen};
use crate::lyrics::types::{LyricsKind, LyricsResult, SourceError, SourceId, SourceResult};
use crate::request::LyricsRequest;

/// Browser profile presented to the scraped sites.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Usable lyric text has at least this many non-empty lines...
const MIN_USABLE_LINES: usize = 2;
/// ...and at least this many characters in total.
const MIN_USABLE_CHARS: usize = 20;

/// What happened at one source that was actually queried.
#[derive(Debug)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub outcome: AttemptOutcome,
}

#[derive(Debug)]
pub enum AttemptOutcome {
    /// The source produced usable lyrics; the cascade stops here.
    Accepted(LyricsResult),
    /// The source answered, but the result failed the usability gate.
    Rejected { reason: String },
    /// The source failed outright.
    Failed(SourceError),
}

/// A source the cascade never queried for this request.
#[derive(Debug)]
pub struct SkippedSource {
    pub source: SourceId,
    pub reason: &'static str,
}

/// Complete trace of one resolution. Every source up to and including the
/// accepting one appears in `attempts` or `skipped`; sources after the
/// accepting one appear in neither.
#[derive(Debug, Default)]
pub struct Resolution {
    pub attempts: Vec<SourceAttempt>,
    pub skipped: Vec<SkippedSource>,
}

impl Resolution {
    /// The accepted result, when any source produced one.
    pub fn chosen(&self) -> Option<&LyricsResult> {
        self.attempts.iter().find_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Accepted(result) => Some(result),
            _ => None,
        })
    }

    pub fn chosen_source(&self) -> Option<SourceId> {
        self.chosen().map(|result| result.source)
    }
}

pub struct Resolver {
    captions: Captions,
    lrclib: LrcLib,
    petitlyrics: PetitLyrics,
    utaten: UtaTen,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(
            Captions::default(),
            LrcLib::default(),
            PetitLyrics::default(),
            UtaTen::default(),
        )
    }
}

impl Resolver {
    pub fn new(
        captions: Captions,
        lrclib: LrcLib,
        petitlyrics: PetitLyrics,
        utaten: UtaTen,
    ) -> Self {
        Self {
            captions,
            lrclib,
            petitlyrics,
            utaten,
        }
    }

    /// Try every source in cascade order until one produces usable lyrics.
    ///
    /// Sources whose required request fields are missing are skipped, not
    /// failed. The whole cascade shares one HTTP client, so cookies set
    /// during a site's warm-up are presented on its later requests.
    pub async fn resolve(&self, req: &LyricsRequest) -> SourceResult<Resolution> {
        let http = build_client()?;
        let mut resolution = Resolution::default();

        for source in SourceId::CASCADE {
            if let Some(reason) = skip_reason(source, req) {
                tracing::debug!(source = %source, reason, "skipping source");
                resolution.skipped.push(SkippedSource { source, reason });
                continue;
            }

            tracing::info!(source = %source, "querying source");
            let outcome = match source {
                SourceId::Captions => self.captions.resolve(&http, req).await,
                SourceId::LrcLib => self.lrclib.resolve(&http, req).await,
                SourceId::PetitLyrics => self.petitlyrics.resolve(&http, req).await,
                SourceId::UtaTen => self.utaten.resolve(&http, req).await,
            };

            let outcome = match outcome {
                Ok(result) => match usability_failure(&result) {
                    None => {
                        tracing::info!(source = %source, "lyrics accepted");
                        AttemptOutcome::Accepted(result)
                    }
                    Some(reason) => {
                        tracing::info!(source = %source, reason, "lyrics rejected");
                        AttemptOutcome::Rejected { reason }
                    }
                },
                Err(err) => {
                    tracing::warn!(source = %source, error = %err, "source failed");
                    AttemptOutcome::Failed(err)
                }
            };

            let accepted = matches!(outcome, AttemptOutcome::Accepted(_));
            resolution.attempts.push(SourceAttempt { source, outcome });
            if accepted {
                break;
            }
        }

        Ok(resolution)
    }
}

fn skip_reason(source: SourceId, req: &LyricsRequest) -> Option<&'static str> {
    match source {
        SourceId::Captions => req.video_id.is_none().then_some("request has no video id"),
        SourceId::LrcLib | SourceId::PetitLyrics | SourceId::UtaTen => {
            (!req.has_search_terms()).then_some("request has neither artist nor title")
        }
    }
}

/// The gate between "a source answered" and "the answer is lyrics".
///
/// Database records are judged by their classification: a record that
/// exists but carries no text is rejected so the scrapers still get their
/// turn. Text from captions and scrapers is judged by shape, since failed
/// extractions tend to come back as one short line of page chrome.
fn usability_failure(result: &LyricsResult) -> Option<String> {
    if result.source == SourceId::LrcLib {
        return (result.kind == LyricsKind::Empty)
            .then(|| "record carries no lyric text".to_string());
    }
    let lines = result.text.lines().filter(|line| !line.trim().is_empty()).count();
    let chars = result.text.chars().count();
    (lines < MIN_USABLE_LINES || chars < MIN_USABLE_CHARS)
        .then(|| format!("text too short to be lyrics: {lines} line(s), {chars} chars"))
}

fn build_client() -> SourceResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.8"));
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_result(source: SourceId, text: &str) -> LyricsResult {
        LyricsResult {
            source,
            text: text.to_string(),
            kind: LyricsKind::Plain,
            metadata: Vec::new(),
            record: None,
        }
    }

    #[test]
    fn gate_rejects_single_line_and_short_text() {
        let one_line = text_result(SourceId::PetitLyrics, "a single line that is long enough");
        assert!(usability_failure(&one_line).is_some());
        let short = text_result(SourceId::Captions, "la\nla");
        assert!(usability_failure(&short).is_some());
        let ok = text_result(SourceId::UtaTen, "昨日人を殺したんだ\nそれでも空は青かった");
        assert!(usability_failure(&ok).is_none());
    }

    #[test]
    fn gate_judges_database_records_by_classification_only() {
        let empty = LyricsResult {
            kind: LyricsKind::Empty,
            ..text_result(SourceId::LrcLib, "")
        };
        assert!(usability_failure(&empty).is_some());
        // One short synced line would fail the shape gate, but database
        // classification trusts the record.
        let synced = LyricsResult {
            kind: LyricsKind::Synced,
            ..text_result(SourceId::LrcLib, "短い")
        };
        assert!(usability_failure(&synced).is_none());
    }

    #[test]
    fn skip_reasons_follow_missing_fields() {
        let no_video = LyricsRequest::new(Some("Ado".into()), Some("踊".into()), None);
        assert!(skip_reason(SourceId::Captions, &no_video).is_some());
        assert!(skip_reason(SourceId::LrcLib, &no_video).is_none());

        let video_only = LyricsRequest::new(None, None, Some("YnSW8gUubIs".into()));
        assert!(skip_reason(SourceId::Captions, &video_only).is_none());
        assert!(skip_reason(SourceId::PetitLyrics, &video_only).is_some());
        assert!(skip_reason(SourceId::UtaTen, &video_only).is_some());
    }
}
