// lyrics/mod.rs - lyric acquisition: sources, text cleanup and hit matching

pub mod html;
pub mod jp;
pub mod normalize;
pub mod select;
pub mod sources;
pub mod srt;
pub mod types;

pub use types::{LyricsKind, LyricsResult, SearchHit, SourceError, SourceId, SourceResult};
