//! Get command implementation
//!
//! Resolves one repository with everything it requires, merges it into the
//! working bundle as a direct requirement and saves both descriptors:
//! 1. Open the working bundle
//! 2. Resolve the target (store first, then git) and prime the store
//! 3. Merge: the target is direct, its whole tree indirect
//! 4. Inspect the result, then save

use console::Style;
use tracing::debug;

use crate::cache::LocalStore;
use crate::cli::GetArgs;
use crate::commands::helpers;
use crate::config::Config;
use crate::error::Result;
use crate::inspector;
use crate::manifester;
use crate::resolver::Fetcher;
use crate::workspace::Workspace;

pub fn run(config: &Config, args: GetArgs) -> Result<()> {
    let mut workspace = Workspace::discover(&config.work_dir)?;
    let version = helpers::requested_version(args.version.as_deref())?;

    let store = LocalStore::new(&config.cache_dir);
    let fetcher = Fetcher::new(&store).with_store_writes(true);

    let pb = helpers::spinner(&format!("Resolving {}", args.repository));
    let resolution = fetcher.resolve(&args.repository, version.as_ref());
    pb.finish_and_clear();
    let resolution = resolution?;
    debug!(nodes = resolution.graph.node_count(), "resolved requirement graph");

    let mut indirect = resolution.direct;
    indirect.extend(resolution.indirect);
    let decisions = manifester::merge(
        &mut workspace.bundle,
        std::slice::from_ref(&resolution.target),
        &indirect,
    )?;

    inspector::inspect(&workspace.bundle)?;
    workspace.save()?;

    println!(
        "{} {}",
        Style::new().green().bold().apply_to("Updated"),
        workspace.bundle.name()
    );
    helpers::print_decisions(&decisions);
    Ok(())
}
