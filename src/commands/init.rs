//! Init command implementation

use console::Style;

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::Result;
use crate::workspace::Workspace;

pub fn run(config: &Config, args: InitArgs) -> Result<()> {
    let workspace = Workspace::init(&config.work_dir, args.name.as_deref())?;
    println!(
        "{} {} in {}",
        Style::new().green().bold().apply_to("Created"),
        workspace.bundle.name(),
        workspace.root.display()
    );
    Ok(())
}
