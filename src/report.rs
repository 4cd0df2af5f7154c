//! Renders a finished resolution as a markdown comment body.

use crate::lyrics::types::{LyricsKind, SourceId};
use crate::request::LyricsRequest;
use crate::resolver::{AttemptOutcome, Resolution, SourceAttempt};

/// Render the full report: the request as understood, one status line per
/// source in cascade order, and the lyrics with their reference details
/// when a source was accepted. Sources the cascade never reached are
/// omitted rather than shown as pending.
pub fn render(req: &LyricsRequest, resolution: &Resolution) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push("## Lyrics lookup".to_string());
    out.push(String::new());
    out.push("### Request".to_string());
    out.push(format!("- artist: {}", req.artist.as_deref().unwrap_or("(unknown)")));
    out.push(format!("- title: {}", req.title.as_deref().unwrap_or("(unknown)")));
    out.push(format!("- video id: {}", req.video_id.as_deref().unwrap_or("(unknown)")));
    out.push(String::new());

    out.push("### Sources".to_string());
    for source in SourceId::CASCADE {
        if let Some(skip) = resolution.skipped.iter().find(|s| s.source == source) {
            out.push(format!("- {}: skipped ({})", source.label(), skip.reason));
        } else if let Some(attempt) = resolution.attempts.iter().find(|a| a.source == source) {
            out.push(format!("- {}: {}", source.label(), attempt_status(attempt)));
        }
    }

    match resolution.chosen() {
        Some(result) => {
            out.push(String::new());
            out.push(format!(
                "### Lyrics ({}, {})",
                result.source.label(),
                kind_label(result.kind)
            ));
            out.push(String::new());
            out.push(format!(
                "**{} - {}**",
                req.artist.as_deref().unwrap_or("(unknown)"),
                req.title.as_deref().unwrap_or("(unknown)")
            ));
            if !result.metadata.is_empty() {
                out.push(String::new());
                for (key, value) in &result.metadata {
                    out.push(format!("- {key}: {value}"));
                }
            }
            out.push(String::new());
            out.push("```text".to_string());
            out.push(result.text.clone());
            out.push("```".to_string());
            if let Some(record) = &result.record {
                out.push(String::new());
                out.push("### Raw record".to_string());
                out.push(String::new());
                out.push("```json".to_string());
                out.push(
                    serde_json::to_string_pretty(record)
                        .unwrap_or_else(|_| record.to_string()),
                );
                out.push("```".to_string());
            }
        }
        None => {
            out.push(String::new());
            out.push(
                "No source produced usable lyrics. The status lines above say why each one came up empty."
                    .to_string(),
            );
        }
    }

    out.join("\n")
}

fn attempt_status(attempt: &SourceAttempt) -> String {
    match &attempt.outcome {
        AttemptOutcome::Accepted(_) => "lyrics found".to_string(),
        AttemptOutcome::Rejected { reason } => format!("rejected ({reason})"),
        AttemptOutcome::Failed(err) => format!("failed ({err})"),
    }
}

fn kind_label(kind: LyricsKind) -> &'static str {
    match kind {
        LyricsKind::Synced => "synced",
        LyricsKind::Plain => "plain text",
        LyricsKind::Empty => "empty record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::types::{LyricsResult, SourceError};
    use crate::resolver::SkippedSource;

    fn request() -> LyricsRequest {
        LyricsRequest::new(Some("Ado".into()), Some("踊".into()), None)
    }

    #[test]
    fn exhausted_resolution_reports_every_step() {
        let resolution = Resolution {
            skipped: vec![SkippedSource {
                source: SourceId::Captions,
                reason: "request has no video id",
            }],
            attempts: vec![
                SourceAttempt {
                    source: SourceId::LrcLib,
                    outcome: AttemptOutcome::Failed(SourceError::NotFound(
                        "lrclib: no records matched the search".to_string(),
                    )),
                },
                SourceAttempt {
                    source: SourceId::PetitLyrics,
                    outcome: AttemptOutcome::Rejected {
                        reason: "text too short to be lyrics: 1 line(s), 25 chars".to_string(),
                    },
                },
                SourceAttempt {
                    source: SourceId::UtaTen,
                    outcome: AttemptOutcome::Failed(SourceError::Parse(
                        "utaten: extraction produced too little text".to_string(),
                    )),
                },
            ],
        };
        let report = render(&request(), &resolution);
        assert!(report.contains("- auto-generated captions: skipped (request has no video id)"));
        assert!(report.contains("- external lyrics database: failed (Not found:"));
        assert!(report.contains("- PetitLyrics: rejected (text too short"));
        assert!(report.contains("- UtaTen: failed (Parse error:"));
        assert!(report.contains("No source produced usable lyrics."));
        assert!(!report.contains("```text"));
    }

    #[test]
    fn accepted_resolution_embeds_the_lyrics_and_record() {
        let record = serde_json::json!({"trackName": "踊", "syncedLyrics": "[00:01.00] ..."});
        let resolution = Resolution {
            skipped: Vec::new(),
            attempts: vec![SourceAttempt {
                source: SourceId::LrcLib,
                outcome: AttemptOutcome::Accepted(LyricsResult {
                    source: SourceId::LrcLib,
                    text: "一行目\n二行目".to_string(),
                    kind: LyricsKind::Synced,
                    metadata: vec![("track", "踊".to_string())],
                    record: Some(record),
                }),
            }],
        };
        let report = render(&request(), &resolution);
        assert!(report.contains("- external lyrics database: lyrics found"));
        assert!(report.contains("### Lyrics (external lyrics database, synced)"));
        assert!(report.contains("**Ado - 踊**"));
        assert!(report.contains("- track: 踊"));
        assert!(report.contains("```text\n一行目\n二行目\n```"));
        assert!(report.contains("### Raw record"));
        assert!(report.contains("\"trackName\": \"踊\""));
    }

    #[test]
    fn unreached_sources_are_absent() {
        let resolution = Resolution {
            skipped: Vec::new(),
            attempts: vec![SourceAttempt {
                source: SourceId::Captions,
                outcome: AttemptOutcome::Accepted(LyricsResult {
                    source: SourceId::Captions,
                    text: "line one\nline two and more".to_string(),
                    kind: LyricsKind::Plain,
                    metadata: Vec::new(),
                    record: None,
                }),
            }],
        };
        let report = render(&request(), &resolution);
        assert!(report.contains("- auto-generated captions: lyrics found"));
        assert!(!report.contains("external lyrics database"));
        assert!(!report.contains("PetitLyrics"));
        assert!(!report.contains("UtaTen"));
    }
}
