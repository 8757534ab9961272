//! Requirement graph built during one resolution
//!
//! The graph lives only as long as the [`Fetcher`](super::Fetcher) call that
//! builds it. Nodes are keyed by `(repository, version)`:
//!
//! ```text
//! BTreeMap<NodeKey, Vec<NodeKey>>
//!    ↓                 ↓
//!  acme@v1.0.0   [foo@v1.0.0, bar@v0.2.0]
//! ```
//!
//! While the walk is in progress the graph also tracks the active path, so a
//! requirement that leads back onto it is reported as a cycle instead of
//! recursing forever.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::bundle::Bundle;
use crate::error::{Result, RulekitError};
use crate::version::VersionExpr;

/// Identity of a node: `(repository, version)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    pub repository: String,
    pub version: String,
}

impl NodeKey {
    pub fn new(repository: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            version: version.into(),
        }
    }

    /// Key of a resolved bundle
    pub fn of(bundle: &Bundle) -> Self {
        Self::new(
            bundle.repository(),
            VersionExpr::display_optional(bundle.version.as_ref()),
        )
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.version)
    }
}

/// Adjacency structure of one resolution
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Node to its requirements, in manifest order
    edges: BTreeMap<NodeKey, Vec<NodeKey>>,

    /// Nodes currently being walked, root first
    path: Vec<NodeKey>,
}

impl DependencyGraph {
    /// Start walking `key`'s requirements
    ///
    /// Fails if `key` is already on the active path.
    pub fn enter(&mut self, key: NodeKey) -> Result<()> {
        if self.path.contains(&key) {
            let chain = self
                .path
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(RulekitError::CircularDependency { chain });
        }
        self.edges.entry(key.clone()).or_default();
        self.path.push(key);
        Ok(())
    }

    /// Finish walking the most recently entered node
    pub fn leave(&mut self) {
        self.path.pop();
    }

    /// Record that `from` requires `to`
    pub fn add_edge(&mut self, from: &NodeKey, to: NodeKey) {
        self.edges.entry(to.clone()).or_default();
        let deps = self.edges.entry(from.clone()).or_default();
        if !deps.contains(&to) {
            deps.push(to);
        }
    }

    /// Requirements recorded for `key`
    pub fn dependencies(&self, key: &NodeKey) -> &[NodeKey] {
        self.edges.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct nodes
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes reachable from `root`, dependencies before dependents
    ///
    /// Siblings keep manifest order. `root` itself comes last.
    pub fn topological_order(&self, root: &NodeKey) -> Vec<NodeKey> {
        let mut visited = BTreeSet::new();
        let mut order = Vec::new();
        self.visit(root, &mut visited, &mut order);
        order
    }

    fn visit(&self, key: &NodeKey, visited: &mut BTreeSet<NodeKey>, order: &mut Vec<NodeKey>) {
        if !visited.insert(key.clone()) {
            return;
        }
        for dep in self.dependencies(key) {
            self.visit(dep, visited, order);
        }
        order.push(key.clone());
    }
}
