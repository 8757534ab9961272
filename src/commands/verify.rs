//! Verify command implementation
//!
//! Runs the regular inspection, then compares every module with its lock
//! file checksum.

use console::Style;

use crate::cli::VerifyArgs;
use crate::config::Config;
use crate::error::Result;
use crate::inspector;
use crate::workspace::Workspace;

pub fn run(config: &Config, args: VerifyArgs) -> Result<()> {
    let root = args.path.unwrap_or_else(|| config.work_dir.clone());
    let workspace = Workspace::discover(&root)?;

    inspector::inspect(&workspace.bundle)?;
    inspector::verify_modules(&workspace.bundle)?;

    println!(
        "{} {} ({} modules)",
        Style::new().green().bold().apply_to("Verified"),
        workspace.bundle.name(),
        workspace.bundle.modules.len()
    );
    Ok(())
}
