//! Bundled Atlanta-metro demo dataset.

use crate::store::{ListingStore, StoreError};

pub const DEMO_LISTINGS_JSON: &str = include_str!("../../../data/listings.json");

pub fn demo_store() -> Result<ListingStore, StoreError> {
    ListingStore::from_json_str(DEMO_LISTINGS_JSON)
}
