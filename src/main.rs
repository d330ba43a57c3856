use clap::Parser;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use taskdeck::auth::Location;
use taskdeck::cli;
use taskdeck::cli::commands::{Cli, Commands};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let location = Location::parse(&cli_args.location);

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Login {
            email,
            first_name,
            last_name,
        } => cli::auth::login(&email, first_name, last_name, &location, json_output),
        Commands::Logout => cli::auth::logout(&location, json_output),
        Commands::Whoami => cli::auth::whoami(&location, json_output),
        Commands::Task(cmd) => cli::task::run(cmd, &location, json_output),
        Commands::Category(cmd) => cli::category::run(cmd, &location, json_output),
        Commands::Status => cli::status::run(&location, json_output),
    };

    process::exit(exit_code);
}
