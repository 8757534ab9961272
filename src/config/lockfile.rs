//! Lock file (rulekit.lock) data structures
//!
//! The lock file records every requirement at any depth, deduplicated by
//! `(repository, version)`, along with the checksums needed to verify a
//! bundle without re-resolving it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EDITION;
use crate::error::{Result, RulekitError};

/// Lock file structure (rulekit.lock)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// SHA-256 of the manifest this lock file was generated for
    pub sum: String,

    /// Lock file schema edition
    pub edition: String,

    /// One record per module file in the bundle
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,

    /// Resolved requirements at any depth
    #[serde(default)]
    pub require: Vec<LockRequirement>,
}

/// Whether a requirement is declared by the bundle itself or pulled in transitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Direct,
    Indirect,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Direct => f.write_str("direct"),
            Direction::Indirect => f.write_str("indirect"),
        }
    }
}

/// A resolved requirement in the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequirement {
    pub repository: String,

    pub direction: Direction,

    pub name: String,

    pub version: String,

    /// Checksum of the dependency's own manifest
    pub h1: String,

    /// Checksum of the dependency's full bundle content
    pub h2: String,
}

/// A module file recorded for later verification without re-parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Declared package path
    pub package: String,

    /// File path inside the bundle
    pub source: String,

    /// Content checksum
    pub sum: String,

    /// Module-level dependency names declared by the module
    #[serde(default)]
    pub require: Vec<String>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}

impl Lockfile {
    /// Create an empty lock file for the current edition
    pub fn new() -> Self {
        Self {
            sum: String::new(),
            edition: EDITION.to_string(),
            modules: Vec::new(),
            require: Vec::new(),
        }
    }

    /// Parse lock file from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RulekitError::LockfileDecodeFailed {
            source_name: crate::config::LOCK_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize lock file to JSON string (pretty-printed)
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Position of the requirement pinned to `(repository, version)`
    pub fn position(&self, repository: &str, version: &str) -> Option<usize> {
        self.require
            .iter()
            .position(|r| r.repository == repository && r.version == version)
    }

    /// Check if `(repository, version)` is already locked
    pub fn contains(&self, repository: &str, version: &str) -> bool {
        self.position(repository, version).is_some()
    }

    /// Find a module record by its source path
    pub fn find_module(&self, source: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(repository: &str, version: &str, direction: Direction) -> LockRequirement {
        LockRequirement {
            repository: repository.to_string(),
            direction,
            name: "foo".to_string(),
            version: version.to_string(),
            h1: "abc".to_string(),
            h2: "blake3:def".to_string(),
        }
    }

    #[test]
    fn test_lockfile_new() {
        let lockfile = Lockfile::new();
        assert_eq!(lockfile.edition, "2024");
        assert!(lockfile.require.is_empty());
        assert!(lockfile.modules.is_empty());
    }

    #[test]
    fn test_lockfile_from_json() {
        let json = r#"{
  "sum": "0123",
  "edition": "2024",
  "modules": [
    {"package": "acme/rules/net/fw", "source": "net/fw.rule", "sum": "blake3:aa", "require": ["example/foo/base"]}
  ],
  "require": [
    {"repository": "github.com/example/foo", "direction": "direct", "name": "foo",
     "version": "v1.0.0", "h1": "11", "h2": "blake3:22"},
    {"repository": "github.com/example/bar", "direction": "indirect", "name": "bar",
     "version": "v0.3.0", "h1": "33", "h2": "blake3:44"}
  ]
}"#;
        let lockfile = Lockfile::from_json(json).unwrap();
        assert_eq!(lockfile.sum, "0123");
        assert_eq!(lockfile.modules[0].require, vec!["example/foo/base"]);
        assert_eq!(lockfile.require[1].direction, Direction::Indirect);
        assert!(lockfile.contains("github.com/example/foo", "v1.0.0"));
        assert!(!lockfile.contains("github.com/example/foo", "v2.0.0"));
        assert!(lockfile.find_module("net/fw.rule").is_some());
    }

    #[test]
    fn test_lockfile_to_json_lowercase_direction() {
        let mut lockfile = Lockfile::new();
        lockfile
            .require
            .push(requirement("github.com/example/foo", "v1.0.0", Direction::Direct));
        let json = lockfile.to_json().unwrap();
        assert!(json.contains(r#""direction": "direct""#));
        assert!(json.ends_with('\n'));
        assert_eq!(Lockfile::from_json(&json).unwrap(), lockfile);
    }

    #[test]
    fn test_lockfile_invalid_json() {
        assert!(matches!(
            Lockfile::from_json("{ not json"),
            Err(RulekitError::LockfileDecodeFailed { .. })
        ));
    }

    #[test]
    fn test_position_matches_repository_and_version() {
        let mut lockfile = Lockfile::new();
        lockfile.require.push(requirement("a", "v1.0.0", Direction::Direct));
        lockfile.require.push(requirement("a", "v2.0.0", Direction::Indirect));
        assert_eq!(lockfile.position("a", "v2.0.0"), Some(1));
        assert_eq!(lockfile.position("b", "v1.0.0"), None);
    }
}
