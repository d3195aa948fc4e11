use barquant::cli::{run, Cli};
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    barquant::logging::init(&cli.log_level);
    run(cli)
}
