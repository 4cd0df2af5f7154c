pub mod captions;
pub mod lrclib;
pub mod petitlyrics;
pub mod utaten;

pub use captions::Captions;
pub use lrclib::LrcLib;
pub use petitlyrics::PetitLyrics;
pub use utaten::UtaTen;
