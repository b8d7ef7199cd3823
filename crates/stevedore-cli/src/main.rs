//! Stevedore CLI - convert docker-compose projects to Kubernetes and OpenShift

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;

use error::CliError;

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author = "Stevedore Contributors")]
#[command(version)]
#[command(about = "Convert docker-compose projects to Kubernetes and OpenShift manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert compose files to Kubernetes or OpenShift objects
    Convert(commands::convert::ConvertArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(console::colors_enabled_stderr())
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let matches = match Cli::command().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => return clap_exit(err),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => return clap_exit(err),
    };

    init_logging(cli.verbose);

    let result = match (&cli.command, matches.subcommand()) {
        (Commands::Convert(args), Some((_, sub))) => commands::convert::run(args, sub),
        (Commands::Convert(_), None) => Err(CliError::internal("missing subcommand arguments")),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Print a clap error; help and version requests exit successfully
fn clap_exit(err: clap::Error) -> ExitCode {
    let code = if err.use_stderr() {
        exit_codes::USAGE_ERROR
    } else {
        exit_codes::SUCCESS
    };
    // Nothing sensible left to report if the terminal is gone
    let _ = err.print();
    ExitCode::from(code)
}
