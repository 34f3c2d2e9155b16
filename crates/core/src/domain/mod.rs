pub mod filter;
pub mod language;
pub mod listing;
