//! Listing model, store, ranking engine and contact model for Homefinder.

pub mod config;
pub mod contact;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod search;
pub mod store;

pub use contact::{
    ContactDispatcher, ContactMethod, ContactOutcome, ContactRequest, UnconfiguredDispatcher,
};
pub use domain::filter::FilterSet;
pub use domain::listing::{Listing, ListingId, RawListing};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use search::{ScoredListing, ScoringWeights, SearchEngine, DEFAULT_TOP_N};
pub use store::{ListingStore, StoreError};
