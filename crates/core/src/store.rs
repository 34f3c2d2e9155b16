//! Read-only listing store.
//!
//! The store is built once at startup from an already-normalized dataset and
//! shared behind an `Arc`. It exposes lookups and the meta projections used by
//! the query parser (known cities, states, zip codes) and by front ends
//! (languages, price range).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::listing::{Listing, ListingId, RawListing};
use crate::errors::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read listings file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse listings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("listing id {0} appears more than once")]
    DuplicateId(ListingId),
    #[error("dataset contains no listings")]
    Empty,
    #[error(transparent)]
    InvalidListing(#[from] DomainError),
}

#[derive(Clone, Debug)]
pub struct ListingStore {
    listings: BTreeMap<ListingId, Listing>,
    max_observed_rent: u32,
}

impl ListingStore {
    pub fn from_listings(listings: Vec<Listing>) -> Result<Self, StoreError> {
        if listings.is_empty() {
            return Err(StoreError::Empty);
        }

        let mut by_id = BTreeMap::new();
        for listing in listings {
            let id = listing.id;
            if by_id.insert(id, listing).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }

        let max_observed_rent =
            by_id.values().map(|listing| listing.monthly_rent).max().unwrap_or(0);

        Ok(Self { listings: by_id, max_observed_rent })
    }

    pub fn from_raw(rows: Vec<RawListing>) -> Result<Self, StoreError> {
        let listings =
            rows.into_iter().map(RawListing::normalize).collect::<Result<Vec<_>, _>>()?;
        Self::from_listings(listings)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        let rows = serde_json::from_str::<Vec<RawListing>>(raw)?;
        Self::from_raw(rows)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| StoreError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, id: ListingId) -> Option<&Listing> {
        self.listings.get(&id)
    }

    /// Listings in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Highest rent in the whole dataset; the affordability baseline.
    pub fn max_observed_rent(&self) -> u32 {
        self.max_observed_rent
    }

    pub fn price_range(&self) -> (u32, u32) {
        let min = self.iter().map(|listing| listing.monthly_rent).min().unwrap_or(0);
        (min, self.max_observed_rent)
    }

    pub fn cities(&self) -> Vec<String> {
        distinct(self.iter().map(|listing| listing.city.as_str()))
    }

    pub fn states(&self) -> Vec<String> {
        distinct(self.iter().map(|listing| listing.state.as_str()))
    }

    pub fn zip_codes(&self) -> Vec<String> {
        distinct(self.iter().map(|listing| listing.zip_code.as_str()))
    }

    pub fn languages(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut languages = Vec::new();
        for language in self.iter().flat_map(|listing| listing.languages_spoken.iter()) {
            if seen.insert(language.to_ascii_lowercase()) {
                languages.push(language.clone());
            }
        }
        languages.sort_by_key(|language| language.to_ascii_lowercase());
        languages
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
