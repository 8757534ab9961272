//! Bundle aggregate
//!
//! A [`Bundle`] is one resolved revision of a policy-rule bundle: its
//! manifest, its lock file and the module files it ships. Bundles own their
//! descriptors outright; nothing is shared between two bundles.

pub mod fileify;

use std::collections::BTreeMap;

use crate::config::{self, Direction, LockRequirement, Lockfile, Manifest, ModuleRecord};
use crate::error::Result;
use crate::hash;
use crate::version::VersionExpr;

pub use fileify::{IgnoreRules, fileify, read_directory, write_files};

/// A module source file with its decoded header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    /// Path inside the bundle, `/`-separated
    pub path: String,

    /// Raw file content
    pub content: Vec<u8>,

    /// Package the module declares
    pub package: String,

    /// Module-level dependency names the module imports
    pub require: Vec<String>,
}

impl ModuleFile {
    /// Package path the module must declare to match its location
    pub fn expected_package(&self, bundle_name: &str) -> String {
        let stem = self
            .path
            .strip_suffix(&format!(".{}", config::MODULE_EXTENSION))
            .unwrap_or(&self.path);
        format!("{}/{}", bundle_name.trim_end_matches('/'), stem)
    }

    /// Lock file record for this module
    pub fn record(&self) -> ModuleRecord {
        ModuleRecord {
            package: self.package.clone(),
            source: self.path.clone(),
            sum: hash::hash_bytes(&self.content),
            require: self.require.clone(),
        }
    }
}

/// A resolved bundle
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Resolved version; `None` for a working bundle read from disk
    pub version: Option<VersionExpr>,

    /// Source the bundle was fetched from; `None` for a working bundle
    pub origin: Option<String>,

    pub manifest: Manifest,

    /// Lock file, if the bundle ships one
    pub lockfile: Option<Lockfile>,

    /// Module source files
    pub modules: Vec<ModuleFile>,

    /// Top-level directories excluded from the bundle
    pub ignore: IgnoreRules,

    /// Any other file carried along (README, LICENSE, ...)
    pub others: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    /// Create a bundle with only a manifest
    pub fn new(manifest: Manifest) -> Self {
        Self {
            version: None,
            origin: None,
            manifest,
            lockfile: None,
            modules: Vec::new(),
            ignore: IgnoreRules::default(),
            others: BTreeMap::new(),
        }
    }

    /// Bundle name from the manifest
    pub fn name(&self) -> &str {
        &self.manifest.package.name
    }

    /// Repository identity
    ///
    /// The fetch source wins, then the manifest's `repository`, then the
    /// bundle name.
    pub fn repository(&self) -> &str {
        if let Some(origin) = &self.origin {
            origin
        } else if self.manifest.package.repository.is_empty() {
            self.name()
        } else {
            &self.manifest.package.repository
        }
    }

    /// Store key `<repository>@<version>`
    pub fn key(&self) -> String {
        format!(
            "{}@{}",
            self.repository(),
            VersionExpr::display_optional(self.version.as_ref())
        )
    }

    /// Canonical manifest checksum; what the lock file's `sum` must equal
    pub fn sum(&self) -> String {
        self.manifest.sum()
    }

    /// Checksum over the full bundle content (manifest and every file)
    ///
    /// The lock file is excluded so that relocking never changes it.
    pub fn content_hash(&self) -> String {
        let manifest_sum = self.sum();
        let ignore = self.ignore.encode();
        let mut files: Vec<(&str, &[u8])> = vec![(config::MANIFEST_FILE, manifest_sum.as_bytes())];
        if !self.ignore.is_empty() {
            files.push((config::IGNORE_FILE, ignore.as_bytes()));
        }
        files.extend(
            self.modules
                .iter()
                .map(|m| (m.path.as_str(), m.content.as_slice())),
        );
        files.extend(self.others.iter().map(|(p, c)| (p.as_str(), c.as_slice())));
        hash::hash_files(files)
    }

    /// Lock file, created on first access
    pub fn lockfile_mut(&mut self) -> &mut Lockfile {
        self.lockfile.get_or_insert_with(Lockfile::new)
    }

    /// Lock file requirement describing this bundle as a dependency
    pub fn lock_requirement(&self, direction: Direction) -> LockRequirement {
        LockRequirement {
            repository: self.repository().to_string(),
            direction,
            name: self.name().to_string(),
            version: VersionExpr::display_optional(self.version.as_ref()),
            h1: self.sum(),
            h2: self.content_hash(),
        }
    }

    /// Rebuild the lock file's module records from the module files
    pub fn refresh_module_records(&mut self) {
        let records = self.modules.iter().map(ModuleFile::record).collect();
        self.lockfile_mut().modules = records;
    }

    /// Encode the bundle back into path to content pairs
    pub fn to_files(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut files = self.others.clone();
        for module in &self.modules {
            files.insert(module.path.clone(), module.content.clone());
        }
        if !self.ignore.is_empty() {
            files.insert(config::IGNORE_FILE.to_string(), self.ignore.encode().into_bytes());
        }
        if let Some(lockfile) = &self.lockfile {
            files.insert(config::LOCK_FILE.to_string(), lockfile.to_json()?.into_bytes());
        }
        files.insert(
            config::MANIFEST_FILE.to_string(),
            self.manifest.to_yaml()?.into_bytes(),
        );
        Ok(files)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders for bundles used across unit tests

    use super::*;
    use crate::config::Requirement;

    /// Build a locked bundle named after the last segment of `repository`
    pub fn bundle(repository: &str, version: &str, requires: &[(&str, &str)]) -> Bundle {
        let name = repository.rsplit('/').next().unwrap_or(repository);
        let mut manifest = Manifest::new(name);
        manifest.package.repository = repository.to_string();
        for (repo, ver) in requires {
            let dep_name = repo.rsplit('/').next().unwrap_or(repo);
            manifest.require.push(Requirement::new(*repo, dep_name, *ver));
        }

        let mut bundle = Bundle::new(manifest);
        bundle.version = Some(VersionExpr::parse(version).unwrap());
        bundle.modules.push(module(name, "main.rule", &[]));
        bundle.refresh_module_records();
        let sum = bundle.sum();
        bundle.lockfile_mut().sum = sum;
        bundle
    }

    /// Build a module file that declares the package matching its path
    pub fn module(bundle_name: &str, path: &str, imports: &[&str]) -> ModuleFile {
        let stem = path.trim_end_matches(".rule");
        let package = format!("{bundle_name}/{stem}");
        let mut content = format!("package {package}\n");
        for import in imports {
            content.push_str(&format!("import {import}\n"));
        }
        content.push_str("\nrule allow { true }\n");
        ModuleFile {
            path: path.to_string(),
            content: content.into_bytes(),
            package,
            require: imports.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{bundle, module};
    use super::*;

    #[test]
    fn test_expected_package() {
        let m = module("acme/rules", "net/fw.rule", &[]);
        assert_eq!(m.expected_package("acme/rules"), "acme/rules/net/fw");
        assert_eq!(m.expected_package("acme/rules/"), "acme/rules/net/fw");
    }

    #[test]
    fn test_key_and_repository() {
        let b = bundle("github.com/example/foo", "v1.0.0", &[]);
        assert_eq!(b.name(), "foo");
        assert_eq!(b.key(), "github.com/example/foo@v1.0.0");

        let mut working = Bundle::new(Manifest::new("acme/rules"));
        assert_eq!(working.repository(), "acme/rules");
        assert_eq!(working.key(), "acme/rules@latest");

        working.origin = Some("/srv/repos/rules".to_string());
        assert_eq!(working.repository(), "/srv/repos/rules");
    }

    #[test]
    fn test_content_hash_tracks_modules() {
        let mut b = bundle("github.com/example/foo", "v1.0.0", &[]);
        let before = b.content_hash();
        b.modules[0].content.extend_from_slice(b"# changed\n");
        assert_ne!(before, b.content_hash());
    }

    #[test]
    fn test_content_hash_ignores_lockfile() {
        let mut b = bundle("github.com/example/foo", "v1.0.0", &[]);
        let before = b.content_hash();
        b.lockfile_mut().sum = "something else".to_string();
        assert_eq!(before, b.content_hash());
    }

    #[test]
    fn test_lock_requirement() {
        let b = bundle("github.com/example/foo", "v1.0.0", &[]);
        let req = b.lock_requirement(Direction::Indirect);
        assert_eq!(req.repository, "github.com/example/foo");
        assert_eq!(req.version, "v1.0.0");
        assert_eq!(req.h1, b.sum());
        assert_eq!(req.h2, b.content_hash());
        assert_eq!(req.direction, Direction::Indirect);
    }

    #[test]
    fn test_to_files_round_trip() {
        let b = bundle("github.com/example/foo", "v1.0.0", &[("github.com/example/bar", "v0.1.0")]);
        let files = b.to_files().unwrap();
        assert!(files.contains_key("rulekit.yaml"));
        assert!(files.contains_key("rulekit.lock"));
        assert!(files.contains_key("main.rule"));

        let decoded = fileify("github.com/example/foo", files).unwrap();
        assert_eq!(decoded.manifest, b.manifest);
        assert_eq!(decoded.lockfile, b.lockfile);
        assert_eq!(decoded.modules, b.modules);
    }
}
