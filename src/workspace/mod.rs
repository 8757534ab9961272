//! The working bundle: the directory a command operates on
//!
//! ## Workspace Structure
//!
//! ```text
//! <work dir>/
//! ├── rulekit.yaml     # Manifest, edited by the author
//! ├── rulekit.lock     # Generated lock file
//! ├── .rulekitignore   # Optional, top-level dirs to leave out
//! └── **/*.rule        # Modules
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bundle::{self, Bundle};
use crate::config::{self, Manifest};
use crate::error::{Result, RulekitError};
use crate::manifester;

/// A working bundle loaded from disk
#[derive(Debug)]
pub struct Workspace {
    /// Directory holding the manifest
    pub root: PathBuf,

    pub bundle: Bundle,
}

impl Workspace {
    /// Whether `root` holds a manifest
    pub fn exists(root: &Path) -> bool {
        root.join(config::MANIFEST_FILE).is_file()
    }

    /// Find a workspace by searching upward from the given path
    pub fn find_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if Self::exists(&current) {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Load the working bundle at `root`
    ///
    /// The lock file may be missing; the bundle is not inspected here.
    pub fn open(root: &Path) -> Result<Self> {
        if !Self::exists(root) {
            return Err(RulekitError::ManifestDecodeFailed {
                source_name: root.display().to_string(),
                reason: format!("{} not found", config::MANIFEST_FILE),
            });
        }

        let files = bundle::read_directory(root)?;
        let bundle = bundle::fileify(&root.display().to_string(), files)?;
        debug!(root = %root.display(), name = bundle.name(), modules = bundle.modules.len(), "opened workspace");

        Ok(Self {
            root: root.to_path_buf(),
            bundle,
        })
    }

    /// Open the workspace containing `start`, searching upward
    pub fn discover(start: &Path) -> Result<Self> {
        match Self::find_from(start) {
            Some(root) => Self::open(&root),
            None => Self::open(start),
        }
    }

    /// Write a fresh manifest and lock file into `root`
    ///
    /// Without an explicit `name` the bundle is named after the `origin`
    /// remote when `root` is inside a git repository, else after the
    /// directory.
    pub fn init(root: &Path, name: Option<&str>) -> Result<Self> {
        if Self::exists(root) {
            return Err(RulekitError::StructureInvalid {
                message: format!("{} already exists in {}", config::MANIFEST_FILE, root.display()),
            });
        }
        std::fs::create_dir_all(root)?;

        let remote = Self::name_from_git_remote(root);
        let mut manifest = match (name, &remote) {
            (Some(name), _) => Manifest::new(name),
            (None, Some((_, name))) => Manifest::new(name.as_str()),
            (None, None) => Manifest::new(Self::fallback_name(root)),
        };
        if let Some((repository, _)) = remote {
            manifest.package.repository = repository;
        }
        manifest.validate()?;

        let mut workspace = Self {
            root: root.to_path_buf(),
            bundle: Bundle::new(manifest),
        };
        let sum = workspace.bundle.sum();
        workspace.bundle.lockfile_mut().sum = sum;
        workspace.save()?;
        Ok(workspace)
    }

    /// Persist the manifest and lock file
    pub fn save(&self) -> Result<()> {
        manifester::save(&self.root, &self.bundle)
    }

    /// `(repository, name)` from the origin remote, e.g.
    /// `("github.com/owner/repo", "owner/repo")`
    fn name_from_git_remote(root: &Path) -> Option<(String, String)> {
        let repo = git2::Repository::discover(root).ok()?;
        let remote = repo.find_remote("origin").ok()?;
        Self::parse_git_url(remote.url()?)
    }

    fn parse_git_url(url: &str) -> Option<(String, String)> {
        let host_path = if let Some(rest) = url.strip_prefix("https://") {
            rest.to_string()
        } else if let Some(rest) = url.strip_prefix("git@") {
            rest.replacen(':', "/", 1)
        } else {
            return None;
        };

        let repository = host_path.trim_end_matches('/').trim_end_matches(".git");
        let segments: Vec<&str> = repository.split('/').collect();
        if segments.len() < 3 {
            return None;
        }
        Some((repository.to_string(), segments[1..].join("/")))
    }

    fn fallback_name(root: &Path) -> String {
        root.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("rules")
            .to_string()
    }
}
