//! Listing search: hard filters, composite scoring and ranking

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use super::scoring::{ComponentScores, ScoreCalculator, ScoringWeights};
use super::DEFAULT_TOP_N;
use crate::domain::filter::FilterSet;
use crate::domain::language::canonical_language;
use crate::domain::listing::Listing;
use crate::store::ListingStore;

/// A listing that survived the hard filters, with its score breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub score: f64,
    pub component_scores: ComponentScores,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: Arc<ListingStore>,
    calculator: ScoreCalculator,
    default_top_n: usize,
}

impl SearchEngine {
    pub fn new(store: Arc<ListingStore>) -> Self {
        Self { store, calculator: ScoreCalculator::new(), default_top_n: DEFAULT_TOP_N }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.calculator = ScoreCalculator::with_weights(weights);
        self
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        if top_n > 0 {
            self.default_top_n = top_n;
        }
        self
    }

    pub fn store(&self) -> &Arc<ListingStore> {
        &self.store
    }

    pub fn default_top_n(&self) -> usize {
        self.default_top_n
    }

    /// Best `top_n` listings for `filters`. `top_n` absent or zero falls back
    /// to the engine default. Truncation happens after the full sort.
    pub fn search(&self, filters: &FilterSet) -> Vec<ScoredListing> {
        let limit = filters.top_n.filter(|n| *n > 0).unwrap_or(self.default_top_n);
        let mut ranked = self.rank(filters);
        ranked.truncate(limit);
        ranked
    }

    /// Every matching listing, score descending, ties by ascending id.
    pub fn rank(&self, filters: &FilterSet) -> Vec<ScoredListing> {
        let max_observed_rent = self.store.max_observed_rent();

        let mut ranked = self
            .store
            .iter()
            .filter(|listing| matches_filters(listing, filters))
            .map(|listing| {
                let component_scores = self.calculator.component_scores(listing, max_observed_rent);
                ScoredListing {
                    listing: listing.clone(),
                    score: self.calculator.calculate_total_score(&component_scores),
                    reasons: self.calculator.generate_reasoning(&component_scores),
                    component_scores,
                }
            })
            .collect::<Vec<_>>();

        ranked.sort_by(compare_ranked);
        ranked
    }
}

fn compare_ranked(a: &ScoredListing, b: &ScoredListing) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.listing.id.cmp(&b.listing.id))
}

/// True when `listing` satisfies every constraint present in `filters`.
pub fn matches_filters(listing: &Listing, filters: &FilterSet) -> bool {
    if let Some(max_rent) = filters.max_rent {
        if listing.monthly_rent > max_rent {
            return false;
        }
    }
    if let Some(min_bedrooms) = filters.min_bedrooms {
        if listing.bedrooms < min_bedrooms {
            return false;
        }
    }
    if let Some(city) = &filters.city {
        if !same_text(&listing.city, city) {
            return false;
        }
    }
    if let Some(state) = &filters.state {
        if !same_text(&listing.state, state) {
            return false;
        }
    }
    if let Some(zip_code) = &filters.zip_code {
        if listing.zip_code.trim() != zip_code.trim() {
            return false;
        }
    }
    if let Some(language) = &filters.language {
        let wanted = canonical_language(language).unwrap_or(language.as_str());
        if !listing.speaks(wanted) {
            return false;
        }
    }
    if let Some(max_ami) = filters.max_ami_percent {
        match listing.income_limit_percent_ami {
            Some(limit) if limit <= max_ami => {}
            _ => return false,
        }
    }

    let required_flags = [
        (filters.section8_accepted, listing.section8_accepted),
        (filters.hud_approved, listing.hud_approved),
        (filters.low_income_eligible, listing.low_income_eligible),
        (filters.nearby_transit, listing.nearby_transit),
        (filters.pets_allowed, listing.pets_allowed),
        (filters.accessibility, listing.has_accessibility_features()),
    ];
    required_flags.iter().all(|(required, actual)| *required != Some(true) || *actual)
}

fn same_text(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}
