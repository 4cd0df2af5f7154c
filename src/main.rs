use std::error::Error;
use std::io::Read as _;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lyricscascade::lyrics::sources::{Captions, LrcLib, PetitLyrics, UtaTen};
use lyricscascade::report;
use lyricscascade::request::{LyricsRequest, parse_issue_body};
use lyricscascade::resolver::Resolver;

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Config {
    /// Artist name (overrides the issue-body field)
    #[arg(long)]
    artist: Option<String>,
    /// Song title (overrides the issue-body field)
    #[arg(long)]
    title: Option<String>,
    /// Video id for the caption source (overrides the issue-body field)
    #[arg(long)]
    video_id: Option<String>,
    /// Read an issue-style request body ("Artist - Title" on the first
    /// line, optionally a video URL below) from this file, "-" for stdin
    #[arg(long, value_name = "PATH")]
    issue_file: Option<String>,
    /// Delay between consecutive requests to the same site, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pace_ms: u64,
    /// Print only the lyric text instead of the markdown report
    #[arg(long)]
    lyrics_only: bool,
}

fn build_request(cfg: &Config) -> Result<LyricsRequest, Box<dyn Error + Send + Sync>> {
    let parsed = match cfg.issue_file.as_deref() {
        Some("-") => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            parse_issue_body(&body)
        }
        Some(path) => parse_issue_body(&std::fs::read_to_string(path)?),
        None => LyricsRequest::default(),
    };
    Ok(LyricsRequest::new(
        cfg.artist.clone().or(parsed.artist),
        cfg.title.clone().or(parsed.title),
        cfg.video_id.clone().or(parsed.video_id),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::parse();
    let req = build_request(&cfg)?;
    if req.artist.is_none() && req.title.is_none() && req.video_id.is_none() {
        return Err("empty request: pass --artist/--title/--video-id or --issue-file".into());
    }

    let pace = Duration::from_millis(cfg.pace_ms);
    let resolver = Resolver::new(
        Captions::default(),
        LrcLib::default(),
        PetitLyrics::default().with_pace(pace),
        UtaTen::default().with_pace(pace),
    );
    let resolution = resolver.resolve(&req).await?;

    if cfg.lyrics_only {
        match resolution.chosen() {
            Some(result) => println!("{}", result.text),
            None => return Err("no source produced usable lyrics".into()),
        }
    } else {
        println!("{}", report::render(&req, &resolution));
    }
    Ok(())
}
