//! Search over the listing store.

pub mod engine;
pub mod scoring;

pub use engine::{matches_filters, ScoredListing, SearchEngine};
pub use scoring::{ComponentScores, ScoreCalculator, ScoringWeights, WeightsError};

/// Number of listings returned when a query does not ask for a count.
pub const DEFAULT_TOP_N: usize = 5;
