//! Version command implementation

use crate::config::EDITION;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    println!("rulekit {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Lock file edition: {EDITION}");
    println!("  Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("  Profile: {}", build_profile());

    Ok(())
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
