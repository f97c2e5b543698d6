use clap::Parser;
use helm_pilot::cli::Cli;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    if let Err(e) = helm_pilot::handlers::run_command(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
