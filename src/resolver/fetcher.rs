//! Fetching bundles from the local store or their git repositories
//!
//! [`Fetcher::fetch`] resolves a single `(source, version)` pair: a store
//! hit is used as-is, anything else falls through to a fresh clone. Either
//! way the bundle is inspected before it is returned.
//!
//! [`Fetcher::resolve`] adds the transitive walk over manifest requirements.

use tempfile::TempDir;
use tracing::{debug, warn};

use super::{DependencyGraph, NodeKey};
use crate::bundle::{self, Bundle};
use crate::cache::LocalStore;
use crate::error::{self, Result, RulekitError};
use crate::git;
use crate::inspector;
use crate::version::VersionExpr;

/// Result of a transitive resolution
#[derive(Debug)]
pub struct Resolution {
    /// The bundle resolution started from
    pub target: Bundle,

    /// Immediate requirements of `target`, in manifest order
    pub direct: Vec<Bundle>,

    /// Deeper requirements, first occurrence of each `(repository, version)`
    pub indirect: Vec<Bundle>,

    /// Requirement graph walked to produce this resolution
    pub graph: DependencyGraph,
}

/// Resolves bundles through the local store and git
#[derive(Debug)]
pub struct Fetcher<'a> {
    store: &'a LocalStore,

    /// Persist remotely fetched bundles into the store
    store_writes: bool,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher that only reads from `store`
    pub fn new(store: &'a LocalStore) -> Self {
        Self {
            store,
            store_writes: false,
        }
    }

    /// Also write every remotely fetched bundle into the store
    pub fn with_store_writes(mut self, enabled: bool) -> Self {
        self.store_writes = enabled;
        self
    }

    /// Resolve one `(source, version)` pair, local store first
    ///
    /// `None` asks for the latest version, which always goes remote.
    pub fn fetch(&self, source: &str, version: Option<&VersionExpr>) -> Result<Bundle> {
        match self.fetch_local(source, version) {
            Ok(Some(bundle)) => return Ok(bundle),
            Ok(None) => {}
            Err(e) => warn!(source, error = %e, "ignoring unusable store entry"),
        }

        let bundle = self.fetch_remote(source, version)?;
        if self.store_writes {
            self.store
                .store(&bundle)
                .map_err(|e| RulekitError::fetching(source, e))?;
        }
        Ok(bundle)
    }

    /// Look `(source, version)` up in the local store
    ///
    /// A missing entry is `Ok(None)`; an entry that fails to load or fails
    /// inspection is an error.
    pub fn fetch_local(&self, source: &str, version: Option<&VersionExpr>) -> Result<Option<Bundle>> {
        let Some(version) = version else {
            return Ok(None);
        };
        if !self.store.exists(source, version) {
            debug!(source, %version, "store miss");
            return Ok(None);
        }

        let bundle = self
            .store
            .load(source, version)
            .map_err(|e| RulekitError::fetching(source, e))?;
        inspector::inspect(&bundle).map_err(|e| RulekitError::fetching(source, e))?;
        debug!(source, %version, "store hit");
        Ok(Some(bundle))
    }

    /// Clone `source` and decode the bundle at the selected commit
    ///
    /// Never writes to the store.
    pub fn fetch_remote(&self, source: &str, version: Option<&VersionExpr>) -> Result<Bundle> {
        self.fetch_remote_inner(source, version)
            .map_err(|e| RulekitError::fetching(source, e))
    }

    fn fetch_remote_inner(&self, source: &str, version: Option<&VersionExpr>) -> Result<Bundle> {
        let scratch = TempDir::new()?;
        let repo = git::clone(source, scratch.path())?;

        let (resolved, commit) = match version {
            None => match git::latest_tag(&repo)? {
                Some((tag, commit)) => (tag, commit),
                None => {
                    let head = git::head_commit(&repo)?;
                    (head.pseudo_version(), head)
                }
            },
            Some(v) if v.is_pseudo() => {
                let commit = git::find_commit_by_pseudo(&repo, v)?
                    .ok_or_else(|| error::version::not_found(v.to_string()))?;
                (v.clone(), commit)
            }
            Some(v) => {
                let commit = git::find_tag(&repo, &v.to_string())?
                    .ok_or_else(|| error::version::not_found(v.to_string()))?;
                (v.clone(), commit)
            }
        };
        debug!(
            source,
            requested = %VersionExpr::display_optional(version),
            resolved = %resolved,
            commit = %commit.hash(),
            "selected commit"
        );

        let files = git::commit_files(&repo, commit.id)?;
        let mut fetched = bundle::fileify(source, files)?;
        fetched.version = Some(resolved);
        fetched.origin = Some(source.to_string());
        inspector::inspect(&fetched)?;
        Ok(fetched)
    }

    /// Fetch `source` and every requirement below it
    pub fn resolve(&self, source: &str, version: Option<&VersionExpr>) -> Result<Resolution> {
        let target = self.fetch(source, version)?;
        self.resolve_bundle(target)
    }

    /// Resolve the requirements of an already loaded bundle
    pub fn resolve_bundle(&self, target: Bundle) -> Result<Resolution> {
        let mut graph = DependencyGraph::default();
        let (direct, mut indirect) = self.resolve_children(&target, &mut graph)?;

        let mut seen = std::collections::BTreeSet::new();
        indirect.retain(|b| seen.insert(NodeKey::of(b)));

        Ok(Resolution {
            target,
            direct,
            indirect,
            graph,
        })
    }

    /// Fetch `parent`'s requirements depth-first
    ///
    /// Returns `(direct, indirect)` where `direct` follows manifest order and
    /// `indirect` is every requirement below those, possibly repeated.
    fn resolve_children(
        &self,
        parent: &Bundle,
        graph: &mut DependencyGraph,
    ) -> Result<(Vec<Bundle>, Vec<Bundle>)> {
        let parent_key = NodeKey::of(parent);
        graph.enter(parent_key.clone())?;

        let mut direct = Vec::with_capacity(parent.manifest.require.len());
        let mut indirect = Vec::new();
        for req in &parent.manifest.require {
            let version = VersionExpr::parse_optional(&req.version)
                .map_err(|e| RulekitError::fetching(&req.repository, e))?;
            let child = self.fetch(&req.repository, version.as_ref())?;
            graph.add_edge(&parent_key, NodeKey::of(&child));

            let (child_direct, child_indirect) = self.resolve_children(&child, graph)?;
            direct.push(child);
            indirect.extend(child_direct);
            indirect.extend(child_indirect);
        }

        graph.leave();
        Ok((direct, indirect))
    }
}
