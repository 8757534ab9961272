//! Install command implementation
//!
//! Resolves a repository and everything it requires into the local store.
//! The working bundle is not touched.

use console::Style;
use tracing::debug;

use crate::cache::LocalStore;
use crate::cli::InstallArgs;
use crate::commands::helpers;
use crate::config::Config;
use crate::error::Result;
use crate::resolver::{Fetcher, NodeKey};

pub fn run(config: &Config, args: InstallArgs) -> Result<()> {
    let version = helpers::requested_version(args.version.as_deref())?;

    let store = LocalStore::new(&config.cache_dir);
    let fetcher = Fetcher::new(&store).with_store_writes(true);

    let pb = helpers::spinner(&format!("Installing {}", args.repository));
    let resolution = fetcher.resolve(&args.repository, version.as_ref());
    pb.finish_and_clear();
    let resolution = resolution?;
    debug!(bundles = resolution.graph.node_count(), "resolved dependency graph");

    let green = Style::new().green().bold();
    let root = NodeKey::of(&resolution.target);
    for key in resolution.graph.topological_order(&root) {
        println!("{} {key}", green.apply_to("Installed"));
    }
    println!("Store: {}", store.root().display());
    Ok(())
}
