//! Bundle resolution
//!
//! - [`fetcher`]: fetch one bundle or a bundle with all its requirements
//! - [`graph`]: the requirement graph, cycle detection included

pub mod fetcher;
pub mod graph;

pub use fetcher::Fetcher;
pub use graph::{DependencyGraph, NodeKey};
