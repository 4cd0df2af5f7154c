pub mod lyrics;
pub mod report;
pub mod request;
pub mod resolver;
