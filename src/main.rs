//! Rulekit - policy-rule bundle manager
//!
//! Resolves the dependencies of policy-rule bundles published as tagged git
//! repositories and keeps a bundle's manifest and lock file consistent and
//! checksum-verified.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bundle;
mod cache;
mod cli;
mod commands;
mod config;
mod error;
mod git;
mod hash;
mod inspector;
mod manifester;
mod resolver;
mod version;
mod workspace;

use cli::{Cli, Commands};
use config::Config;
use error::Result;

/// Send diagnostics to stderr, filtered by `RUST_LOG`
///
/// `--verbose` lowers the default level from `warn` to `debug`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "rulekit=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.work_dir, cli.cache_dir)?;

    match cli.command {
        Commands::Get(args) => commands::get::run(&config, args),
        Commands::Check(args) => commands::check::run(&config, args),
        Commands::Install(args) => commands::install::run(&config, args),
        Commands::Verify(args) => commands::verify::run(&config, args),
        Commands::Init(args) => commands::init::run(&config, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
