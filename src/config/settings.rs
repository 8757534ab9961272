//! Per-invocation settings
//!
//! Resolved once in `main` from CLI flags and the environment, then passed
//! down to commands.

use std::path::PathBuf;

use crate::error::{Result, RulekitError};

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "RULEKIT_CACHE_DIR";

/// Default cache directory name under user's cache directory
const CACHE_DIR: &str = "rulekit";

/// Resolved settings for one rulekit invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the working bundle (manifest, lock file, modules)
    pub work_dir: PathBuf,

    /// Root of the local store
    pub cache_dir: PathBuf,
}

impl Config {
    /// Resolve settings, preferring explicit flags over the environment
    ///
    /// The cache directory comes from `cache_dir`, else `RULEKIT_CACHE_DIR`,
    /// else `~/.cache/rulekit` (or the platform equivalent).
    pub fn resolve(work_dir: Option<PathBuf>, cache_dir: Option<PathBuf>) -> Result<Self> {
        let work_dir = match work_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };

        Ok(Self {
            work_dir,
            cache_dir,
        })
    }
}

fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let base = dirs::cache_dir().ok_or_else(|| RulekitError::CacheOperationFailed {
        message: "Could not determine cache directory".to_string(),
    })?;

    Ok(base.join(CACHE_DIR))
}
