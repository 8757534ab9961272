//! Local bundle store
//!
//! Previously resolved bundles are kept on disk so that repeated resolutions
//! do not re-clone their repositories.
//!
//! ## Store Structure
//!
//! ```text
//! ~/.cache/rulekit/
//! └── bundles/
//!     └── <source-slug>-<source-digest>@<version>/
//!         ├── rulekit.yaml
//!         ├── rulekit.lock
//!         └── <module files>
//! ```
//!
//! The store never verifies what it loads; callers run the inspector.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bundle::{self, Bundle};
use crate::config;
use crate::error::{self, Result, RulekitError};
use crate::hash;
use crate::version::VersionExpr;

/// Bundles subdirectory within the store root
const BUNDLES_DIR: &str = "bundles";

/// Hex digits of the source digest appended to each entry's slug
const SOURCE_DIGEST_LEN: usize = 8;

/// Generate a directory-safe slug from a repository source
///
/// Example: "https://github.com/author/repo.git" -> "github.com-author-repo"
pub fn url_to_slug(url: &str) -> String {
    url.replace("https://", "")
        .replace("http://", "")
        .replace("file://", "")
        .replace("ssh://", "")
        .replace("git@", "")
        .replace([':', '/', '\\'], "-")
        .replace(".git", "")
        .trim_matches('-')
        .to_string()
}

/// Content-addressed cache of resolved bundles keyed by `source@version`
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `source@version`
    ///
    /// The slug is suffixed with a digest of the exact source, since distinct
    /// sources can share a slug.
    pub fn bundle_path(&self, source: &str, version: &VersionExpr) -> PathBuf {
        let digest = hash::sha256_hex(source.as_bytes());
        self.root.join(BUNDLES_DIR).join(format!(
            "{}-{}@{}",
            url_to_slug(source),
            &digest[..SOURCE_DIGEST_LEN],
            version
        ))
    }

    /// Check whether `source@version` is present (no integrity check)
    pub fn exists(&self, source: &str, version: &VersionExpr) -> bool {
        self.bundle_path(source, version).is_dir()
    }

    /// Load `source@version` from the store
    pub fn load(&self, source: &str, version: &VersionExpr) -> Result<Bundle> {
        let path = self.bundle_path(source, version);
        if !path.is_dir() {
            return Err(RulekitError::StoreNotFound {
                key: format!("{source}@{version}"),
            });
        }

        debug!(source, %version, path = %path.display(), "loading bundle from store");
        let files = bundle::read_directory(&path)?;
        let mut loaded = bundle::fileify(source, files)?;
        loaded.version = Some(version.clone());
        loaded.origin = Some(source.to_string());
        Ok(loaded)
    }

    /// Persist a bundle under its `repository@version` key
    ///
    /// Module and other files are written first, then the lock file, then
    /// the manifest. Re-storing a key overwrites its descriptor files but
    /// does not purge modules left over from an earlier store.
    pub fn store(&self, bundle: &Bundle) -> Result<PathBuf> {
        let version = bundle.version.as_ref().ok_or_else(|| {
            RulekitError::CacheOperationFailed {
                message: format!("cannot store unversioned bundle '{}'", bundle.name()),
            }
        })?;

        let path = self.bundle_path(bundle.repository(), version);
        std::fs::create_dir_all(&path)
            .map_err(|e| error::fs::write_failed(path.display().to_string(), e.to_string()))?;

        let mut files = bundle.to_files()?;
        let manifest = files.remove(config::MANIFEST_FILE);
        let lockfile = files.remove(config::LOCK_FILE);

        bundle::write_files(&path, &files)?;
        for (name, content) in [(config::LOCK_FILE, lockfile), (config::MANIFEST_FILE, manifest)] {
            if let Some(content) = content {
                bundle::write_files(&path, [(&name.to_string(), &content)])?;
            }
        }

        debug!(key = %bundle.key(), path = %path.display(), "stored bundle");
        Ok(path)
    }
}
