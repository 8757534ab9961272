//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rulekit - policy-rule bundle manager
///
/// Resolve, lock and verify policy-rule bundles published as tagged git repositories.
#[derive(Parser, Debug)]
#[command(
    name = "rulekit",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Package manager for policy-rule bundles",
    long_about = "Rulekit resolves policy-rule bundles and their dependencies from tagged git \
                  repositories, records them in rulekit.yaml and rulekit.lock, and verifies \
                  bundles against their recorded checksums.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  rulekit init acme/rules\n    \
                  rulekit get github.com/example/foo -v v1.2.0\n    \
                  rulekit tidy\n    \
                  rulekit install github.com/example/foo\n    \
                  rulekit verify"
)]
pub struct Cli {
    /// Bundle directory (defaults to current directory)
    #[arg(long, short = 'w', global = true)]
    pub work_dir: Option<PathBuf>,

    /// Local store directory (defaults to $RULEKIT_CACHE_DIR, then the user cache dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add or change a direct requirement
    Get(GetArgs),

    /// Re-resolve every requirement and rebuild the lock file
    #[command(visible_alias = "tidy")]
    Check(CheckArgs),

    /// Fetch a bundle and its requirements into the local store
    Install(InstallArgs),

    /// Check every module against its lock file checksum
    Verify(VerifyArgs),

    /// Create rulekit.yaml and rulekit.lock
    Init(InitArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the get command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Require the latest release:\n    rulekit get github.com/example/foo\n\n\
                  Require a specific release:\n    rulekit get github.com/example/foo -v v1.2.0\n\n\
                  Require an untagged commit:\n    rulekit get github.com/example/foo -v v0.0.0+20240101120000-0123456789ab")]
pub struct GetArgs {
    /// Repository of the bundle to require
    pub repository: String,

    /// Version to require (latest release when omitted)
    #[arg(long, short = 'v')]
    pub version: Option<String>,
}

/// Arguments for the check/tidy command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Bundle directory (overrides --work-dir)
    pub path: Option<PathBuf>,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Repository of the bundle to install
    pub repository: String,

    /// Version to install (latest release when omitted)
    #[arg(long, short = 'v')]
    pub version: Option<String>,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Bundle directory (overrides --work-dir)
    pub path: Option<PathBuf>,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Bundle name (defaults to the origin remote, then the directory name)
    pub name: Option<String>,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    rulekit completions bash > ~/.bash_completion.d/rulekit\n\n\
                  Generate zsh completions:\n    rulekit completions zsh > ~/.zfunc/_rulekit")]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
