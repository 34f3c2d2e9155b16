use serde::Serialize;

use crate::commands::{load_controller, to_json, CommandResult, ContextOptions};

#[derive(Debug, Serialize)]
struct MetaReport {
    listings_path: String,
    listing_count: usize,
    cities: Vec<String>,
    states: Vec<String>,
    languages: Vec<String>,
    min_rent: u32,
    max_rent: u32,
}

pub fn run(options: &ContextOptions) -> CommandResult {
    let (config, controller) = match load_controller("meta", options) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let store = controller.engine().store();
    let (min_rent, max_rent) = store.price_range();
    to_json(
        "meta",
        &MetaReport {
            listings_path: config.data.listings_path.display().to_string(),
            listing_count: store.len(),
            cities: store.cities(),
            states: store.states(),
            languages: store.languages(),
            min_rent,
            max_rent,
        },
    )
}
