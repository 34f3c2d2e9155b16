pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{ContextOptions, SearchArgs};

#[derive(Debug, Parser)]
#[command(
    name = "homefinder",
    about = "Homefinder affordable-housing search CLI",
    long_about = "Search affordable-housing listings in plain language, inspect the dataset, \
                  and check runtime configuration.",
    after_help = "Examples:\n  homefinder chat\n  homefinder parse \"2 bedroom under $800 in Atlanta\"\n  \
                  homefinder search --max-rent 900 --city Decatur --section8 --json\n  \
                  homefinder doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a homefinder.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Path to the listings JSON dataset")]
    data: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Log at the configured level instead of warn")]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive housing search conversation")]
    Chat,
    #[command(about = "Show the filters extracted from a free-text request")]
    Parse {
        #[arg(required = true, num_args = 1.., help = "Free-text housing request")]
        text: Vec<String>,
    },
    #[command(about = "Run a structured search and print ranked listings")]
    Search(SearchArgs),
    #[command(about = "Summarize the loaded dataset: cities, languages and rent range")]
    Meta,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, dataset loading and contact channel readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = ContextOptions { config_path: cli.global.config, listings_path: cli.global.data };
    commands::init_logging(&options, cli.global.verbose);

    let result = match cli.command {
        Command::Chat => commands::chat::run(&options),
        Command::Parse { text } => commands::parse::run(&options, &text.join(" ")),
        Command::Search(args) => commands::search::run(&options, args),
        Command::Meta => commands::meta::run(&options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
