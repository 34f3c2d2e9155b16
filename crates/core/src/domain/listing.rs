use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u32);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized dataset row. Listings are only built through
/// [`RawListing::normalize`] and are never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing {
    pub id: ListingId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub monthly_rent: u32,
    pub bedrooms: u32,
    pub bathrooms: f32,
    pub sqft: Option<u32>,
    pub property_type: String,
    pub section8_accepted: bool,
    pub hud_approved: bool,
    pub low_income_eligible: bool,
    pub nearby_transit: bool,
    pub pets_allowed: bool,
    pub income_limit_percent_ami: Option<u32>,
    pub utilities_included: Option<String>,
    pub accessibility_features: Option<String>,
    pub languages_spoken: Vec<String>,
    pub agent_name: String,
    pub agent_phone: String,
    pub agent_email: String,
    pub neighborhood_description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Listing {
    pub fn has_utilities_included(&self) -> bool {
        self.utilities_included.is_some()
    }

    pub fn has_accessibility_features(&self) -> bool {
        self.accessibility_features.is_some()
    }

    /// Case-insensitive membership test against `languages_spoken`.
    pub fn speaks(&self, language: &str) -> bool {
        let wanted = language.trim();
        self.languages_spoken.iter().any(|spoken| spoken.eq_ignore_ascii_case(wanted))
    }

    pub fn full_address(&self) -> String {
        format!("{}, {}, {} {}", self.address, self.city, self.state, self.zip_code)
            .trim_end()
            .to_string()
    }
}

/// Dataset row as it appears in the source file, before normalization.
///
/// Boolean columns tolerate `true`/`"True"`/`"yes"`/`1`, free-text columns
/// treat blank and `"None"` as absent, and `languages_spoken` may be either a
/// comma-separated string or an array.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawListing {
    pub id: u32,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<RawText>,
    pub monthly_rent: f64,
    #[serde(default)]
    pub bedrooms: Option<f64>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub sqft: Option<f64>,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub section8_accepted: Option<RawFlag>,
    #[serde(default)]
    pub hud_approved: Option<RawFlag>,
    #[serde(default)]
    pub low_income_eligible: Option<RawFlag>,
    #[serde(default)]
    pub nearby_transit: Option<RawFlag>,
    #[serde(default)]
    pub pets_allowed: Option<RawFlag>,
    #[serde(default)]
    pub income_limit_percent_ami: Option<RawText>,
    #[serde(default)]
    pub utilities_included: Option<String>,
    #[serde(default)]
    pub accessibility_features: Option<String>,
    #[serde(default)]
    pub languages_spoken: Option<RawLanguages>,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub agent_phone: String,
    #[serde(default)]
    pub agent_email: String,
    #[serde(default)]
    pub neighborhood_description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawFlag {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value == 1.0,
            Self::Text(value) => {
                matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "y")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Number(f64),
    Text(String),
}

impl RawText {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Number(value) if value.is_finite() => Some(format!("{value}")),
            Self::Number(_) => None,
            Self::Text(value) => present_text(Some(value)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawLanguages {
    Joined(String),
    List(Vec<String>),
}

impl RawLanguages {
    fn into_parts(self) -> Vec<String> {
        match self {
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            Self::List(list) => list,
        }
    }
}

impl RawListing {
    pub fn normalize(self) -> Result<Listing, DomainError> {
        let id = ListingId(self.id);

        if !self.monthly_rent.is_finite() || self.monthly_rent < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "listing {id}: monthly_rent must be a non-negative number"
            )));
        }
        let bedrooms = self.bedrooms.unwrap_or(0.0);
        if !bedrooms.is_finite() || bedrooms < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "listing {id}: bedrooms must be a non-negative number"
            )));
        }

        let income_limit_percent_ami = self
            .income_limit_percent_ami
            .and_then(RawText::into_text)
            .and_then(|text| text.trim_end_matches('%').parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value.round() as u32);

        Ok(Listing {
            id,
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.and_then(RawText::into_text).unwrap_or_default(),
            monthly_rent: self.monthly_rent.round() as u32,
            bedrooms: bedrooms.trunc() as u32,
            bathrooms: self
                .bathrooms
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value as f32)
                .unwrap_or(0.0),
            sqft: self.sqft.filter(|value| value.is_finite() && *value > 0.0).map(|v| v as u32),
            property_type: self.property_type.trim().to_string(),
            section8_accepted: flag(&self.section8_accepted),
            hud_approved: flag(&self.hud_approved),
            low_income_eligible: flag(&self.low_income_eligible),
            nearby_transit: flag(&self.nearby_transit),
            pets_allowed: flag(&self.pets_allowed),
            income_limit_percent_ami,
            utilities_included: present_text(self.utilities_included),
            accessibility_features: present_text(self.accessibility_features),
            languages_spoken: dedupe_languages(
                self.languages_spoken.map(RawLanguages::into_parts).unwrap_or_default(),
            ),
            agent_name: self.agent_name.trim().to_string(),
            agent_phone: self.agent_phone.trim().to_string(),
            agent_email: self.agent_email.trim().to_string(),
            neighborhood_description: self.neighborhood_description.trim().to_string(),
            latitude: self.latitude.filter(|value| value.is_finite()),
            longitude: self.longitude.filter(|value| value.is_finite()),
        })
    }
}

fn flag(raw: &Option<RawFlag>) -> bool {
    raw.as_ref().map(RawFlag::is_truthy).unwrap_or(false)
}

fn present_text(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| {
        !text.is_empty() && !text.eq_ignore_ascii_case("none") && !text.eq_ignore_ascii_case("nan")
    })
}

fn dedupe_languages(parts: Vec<String>) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for part in parts {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !languages.iter().any(|known| known.eq_ignore_ascii_case(trimmed)) {
            languages.push(trimmed.to_string());
        }
    }
    languages
}
