use std::process::ExitCode;

fn main() -> ExitCode {
    homefinder_cli::run()
}
