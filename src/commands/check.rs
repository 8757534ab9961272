//! Check (tidy) command implementation
//!
//! Re-resolves every manifest requirement of the working bundle and rebuilds
//! the lock file's requirement list from scratch, so entries for versions no
//! longer required are dropped.

use console::Style;

use crate::cache::LocalStore;
use crate::cli::CheckArgs;
use crate::commands::helpers;
use crate::config::Config;
use crate::error::Result;
use crate::inspector;
use crate::manifester;
use crate::resolver::Fetcher;
use crate::workspace::Workspace;

pub fn run(config: &Config, args: CheckArgs) -> Result<()> {
    let root = args.path.unwrap_or_else(|| config.work_dir.clone());
    let mut workspace = Workspace::discover(&root)?;

    let store = LocalStore::new(&config.cache_dir);
    let fetcher = Fetcher::new(&store).with_store_writes(true);

    let pb = helpers::spinner(&format!("Resolving {}", workspace.bundle.name()));
    let resolution = fetcher.resolve_bundle(workspace.bundle.clone());
    pb.finish_and_clear();
    let resolution = resolution?;

    workspace.bundle.lockfile_mut().require.clear();
    manifester::merge(&mut workspace.bundle, &resolution.direct, &resolution.indirect)?;

    inspector::inspect(&workspace.bundle)?;
    workspace.save()?;

    let locked = workspace.bundle.lockfile.as_ref().map_or(0, |l| l.require.len());
    println!(
        "{} {} ({locked} requirements locked)",
        Style::new().green().bold().apply_to("Tidied"),
        root.display(),
    );
    Ok(())
}
