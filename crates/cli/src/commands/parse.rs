use homefinder_core::domain::filter::FilterSet;
use serde::Serialize;

use crate::commands::{load_controller, to_json, CommandResult, ContextOptions};

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    text: &'a str,
    constrained: bool,
    filters: FilterSet,
}

pub fn run(options: &ContextOptions, text: &str) -> CommandResult {
    let (_, controller) = match load_controller("parse", options) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let filters = controller.parser().parse(text);
    to_json("parse", &ParseReport { text, constrained: !filters.is_empty(), filters })
}
