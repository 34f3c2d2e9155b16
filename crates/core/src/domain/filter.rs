use serde::{Deserialize, Serialize};

/// Structured query built either by the query parser or from form input.
///
/// Every field is optional; an absent field imposes no constraint. Amenity
/// flags only constrain when set to `Some(true)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section8_accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hud_approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_income_eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_transit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pets_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ami_percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field constrains the result set. `top_n` is not a
    /// constraint and is ignored here.
    pub fn is_empty(&self) -> bool {
        self.max_rent.is_none()
            && self.min_bedrooms.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.language.is_none()
            && !requires(self.section8_accepted)
            && !requires(self.hud_approved)
            && !requires(self.low_income_eligible)
            && !requires(self.nearby_transit)
            && !requires(self.pets_allowed)
            && !requires(self.accessibility)
            && self.max_ami_percent.is_none()
    }

    pub fn with_max_rent(mut self, max_rent: u32) -> Self {
        self.max_rent = Some(max_rent);
        self
    }

    pub fn with_min_bedrooms(mut self, min_bedrooms: u32) -> Self {
        self.min_bedrooms = Some(min_bedrooms);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = Some(zip_code.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_section8(mut self) -> Self {
        self.section8_accepted = Some(true);
        self
    }

    pub fn with_hud_approved(mut self) -> Self {
        self.hud_approved = Some(true);
        self
    }

    pub fn with_low_income(mut self) -> Self {
        self.low_income_eligible = Some(true);
        self
    }

    pub fn with_transit(mut self) -> Self {
        self.nearby_transit = Some(true);
        self
    }

    pub fn with_pets(mut self) -> Self {
        self.pets_allowed = Some(true);
        self
    }

    pub fn with_accessibility(mut self) -> Self {
        self.accessibility = Some(true);
        self
    }

    pub fn with_max_ami_percent(mut self, percent: u32) -> Self {
        self.max_ami_percent = Some(percent);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

fn requires(flag: Option<bool>) -> bool {
    flag == Some(true)
}

#[cfg(test)]
mod tests {
    use super::FilterSet;

    #[test]
    fn default_filter_set_is_empty() {
        assert!(FilterSet::new().is_empty());
        assert!(FilterSet::new().with_top_n(3).is_empty());
    }

    #[test]
    fn false_amenity_flags_do_not_constrain() {
        let filters = FilterSet { pets_allowed: Some(false), ..FilterSet::default() };
        assert!(filters.is_empty());
        assert!(!FilterSet::new().with_pets().is_empty());
    }

    #[test]
    fn serializes_only_present_fields() {
        let filters = FilterSet::new().with_max_rent(800).with_city("Atlanta");
        let json = serde_json::to_value(&filters).expect("serialize");
        assert_eq!(json, serde_json::json!({"max_rent": 800, "city": "Atlanta"}));
    }
}
