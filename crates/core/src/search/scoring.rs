//! Scoring signals for listing ranking

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::listing::Listing;

/// Weights for scoring components. Each component is in `[0, 1]` before
/// weighting and the weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for affordability relative to the whole dataset (default: 0.45)
    pub affordability: f64,
    /// Weight for low-income eligibility (default: 0.15)
    pub low_income_eligible: f64,
    /// Weight for Section 8 acceptance (default: 0.10)
    pub section8_accepted: f64,
    /// Weight for HUD approval (default: 0.10)
    pub hud_approved: f64,
    /// Weight for nearby transit (default: 0.10)
    pub nearby_transit: f64,
    /// Weight for included utilities (default: 0.05)
    pub utilities_included: f64,
    /// Weight for accessibility features (default: 0.05)
    pub accessibility_features: f64,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight `{component}` must be a non-negative number (got {value})")]
    InvalidComponent { component: &'static str, value: f64 },
    #[error("weights must sum to 1.0 (got {0:.4})")]
    Sum(f64),
}

impl ScoringWeights {
    pub const DEFAULT: Self = Self {
        affordability: 0.45,
        low_income_eligible: 0.15,
        section8_accepted: 0.10,
        hud_approved: 0.10,
        nearby_transit: 0.10,
        utilities_included: 0.05,
        accessibility_features: 0.05,
    };

    pub fn sum(&self) -> f64 {
        self.affordability
            + self.low_income_eligible
            + self.section8_accepted
            + self.hud_approved
            + self.nearby_transit
            + self.utilities_included
            + self.accessibility_features
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        let all = [
            ("affordability", self.affordability),
            ("low_income_eligible", self.low_income_eligible),
            ("section8_accepted", self.section8_accepted),
            ("hud_approved", self.hud_approved),
            ("nearby_transit", self.nearby_transit),
            ("utilities_included", self.utilities_included),
            ("accessibility_features", self.accessibility_features),
        ];
        if let Some((component, value)) =
            all.into_iter().find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(WeightsError::InvalidComponent { component, value });
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(WeightsError::Sum(sum));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Individual scoring components, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub affordability: f64,
    pub low_income_eligible: f64,
    pub section8_accepted: f64,
    pub hud_approved: f64,
    pub nearby_transit: f64,
    pub utilities_included: f64,
    pub accessibility_features: f64,
}

/// Score calculator for listings
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default() }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// `1 - rent / max_observed_rent`, clamped to `[0, 1]`. The baseline is
    /// the most expensive listing in the store, not in the filtered subset.
    pub fn affordability(&self, monthly_rent: u32, max_observed_rent: u32) -> f64 {
        if max_observed_rent == 0 {
            return 1.0;
        }
        (1.0 - f64::from(monthly_rent) / f64::from(max_observed_rent)).clamp(0.0, 1.0)
    }

    pub fn component_scores(&self, listing: &Listing, max_observed_rent: u32) -> ComponentScores {
        ComponentScores {
            affordability: self.affordability(listing.monthly_rent, max_observed_rent),
            low_income_eligible: indicator(listing.low_income_eligible),
            section8_accepted: indicator(listing.section8_accepted),
            hud_approved: indicator(listing.hud_approved),
            nearby_transit: indicator(listing.nearby_transit),
            utilities_included: indicator(listing.has_utilities_included()),
            accessibility_features: indicator(listing.has_accessibility_features()),
        }
    }

    pub fn calculate_total_score(&self, components: &ComponentScores) -> f64 {
        let weights = &self.weights;
        components.affordability * weights.affordability
            + components.low_income_eligible * weights.low_income_eligible
            + components.section8_accepted * weights.section8_accepted
            + components.hud_approved * weights.hud_approved
            + components.nearby_transit * weights.nearby_transit
            + components.utilities_included * weights.utilities_included
            + components.accessibility_features * weights.accessibility_features
    }

    /// Generate human-readable reasons for a listing's rank
    pub fn generate_reasoning(&self, components: &ComponentScores) -> Vec<String> {
        let mut reasons = Vec::new();

        if components.affordability >= 0.4 {
            reasons.push("Priced well below the most expensive listings".to_string());
        }
        if components.low_income_eligible > 0.0 {
            reasons.push("Eligible for low-income programs".to_string());
        }
        if components.section8_accepted > 0.0 {
            reasons.push("Accepts Section 8 vouchers".to_string());
        }
        if components.hud_approved > 0.0 {
            reasons.push("HUD approved".to_string());
        }
        if components.nearby_transit > 0.0 {
            reasons.push("Close to public transit".to_string());
        }
        if components.utilities_included > 0.0 {
            reasons.push("Some utilities included".to_string());
        }
        if components.accessibility_features > 0.0 {
            reasons.push("Has accessibility features".to_string());
        }

        if reasons.is_empty() {
            reasons.push("Matches your search".to_string());
        }

        reasons
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
