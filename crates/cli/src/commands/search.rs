use clap::Args;
use homefinder_agent::controller::format_search_reply;
use homefinder_core::domain::filter::FilterSet;

use crate::commands::{load_controller, to_json, CommandResult, ContextOptions};

#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    #[arg(long, help = "Maximum monthly rent in dollars")]
    pub max_rent: Option<u32>,
    #[arg(long, help = "Minimum number of bedrooms (0 for studios)")]
    pub min_bedrooms: Option<u32>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long, help = "Two-letter state code")]
    pub state: Option<String>,
    #[arg(long)]
    pub zip: Option<String>,
    #[arg(long, help = "Language the agent should speak")]
    pub language: Option<String>,
    #[arg(long)]
    pub section8: bool,
    #[arg(long)]
    pub hud: bool,
    #[arg(long)]
    pub low_income: bool,
    #[arg(long)]
    pub transit: bool,
    #[arg(long)]
    pub pets: bool,
    #[arg(long)]
    pub accessible: bool,
    #[arg(long, help = "Only listings with an income limit at or below this % of AMI")]
    pub max_ami: Option<u32>,
    #[arg(long, help = "Number of listings to return")]
    pub top_n: Option<usize>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl SearchArgs {
    pub fn to_filters(&self) -> FilterSet {
        FilterSet {
            max_rent: self.max_rent,
            min_bedrooms: self.min_bedrooms,
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip.clone(),
            language: self.language.clone(),
            section8_accepted: self.section8.then_some(true),
            hud_approved: self.hud.then_some(true),
            low_income_eligible: self.low_income.then_some(true),
            nearby_transit: self.transit.then_some(true),
            pets_allowed: self.pets.then_some(true),
            accessibility: self.accessible.then_some(true),
            max_ami_percent: self.max_ami,
            top_n: self.top_n,
        }
    }
}

pub fn run(options: &ContextOptions, args: SearchArgs) -> CommandResult {
    let (_, controller) = match load_controller("search", options) {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let filters = args.to_filters();
    let reply = controller.handle_filters(&filters);
    if args.json {
        return to_json("search", &reply);
    }
    CommandResult::output(format_search_reply(&filters, &reply.listings))
}
