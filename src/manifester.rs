//! Reconciling resolved dependencies into a bundle's manifest and lock file
//!
//! [`merge`] folds freshly resolved bundles into a parent: direct
//! dependencies land in both files, indirect ones only in the lock file.
//! [`save`] then persists the pair.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::bundle::Bundle;
use crate::config::{self, Direction, Lockfile, Requirement};
use crate::error::{self, Result, RulekitError};
use crate::version::VersionExpr;

/// What [`merge`] did with one incoming dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Already required at this version and locked
    Unchanged { repository: String, version: String },

    /// New direct requirement
    Added { repository: String, version: String },

    /// Existing requirement replaced by a newer (or equal-precedence) version
    Upgraded {
        repository: String,
        from: String,
        to: String,
    },

    /// Existing requirement replaced by an older version
    Downgraded {
        repository: String,
        from: String,
        to: String,
    },

    /// New indirect lock entry
    Indirect { repository: String, version: String },
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Unchanged {
                repository,
                version,
            } => write!(f, "{repository}@{version} is already required"),
            Decision::Added {
                repository,
                version,
            } => write!(f, "added {repository}@{version}"),
            Decision::Upgraded {
                repository,
                from,
                to,
            } => write!(f, "upgrading {repository} {from} => {to}"),
            Decision::Downgraded {
                repository,
                from,
                to,
            } => write!(f, "installing an older version of {repository}: {from} => {to}"),
            Decision::Indirect {
                repository,
                version,
            } => write!(f, "locked {repository}@{version} (indirect)"),
        }
    }
}

/// Merge resolved dependencies into `parent`
///
/// Each `direct` bundle is added to the manifest, or replaces the manifest
/// entry for the same repository in place. Each `indirect` bundle gets a lock
/// entry unless `(repository, version)` is already locked. The lock file's
/// `sum` is recomputed last.
pub fn merge(parent: &mut Bundle, direct: &[Bundle], indirect: &[Bundle]) -> Result<Vec<Decision>> {
    let mut decisions = Vec::with_capacity(direct.len() + indirect.len());

    for dep in direct {
        decisions.push(merge_direct(parent, dep)?);
    }

    for dep in indirect {
        let repository = dep.repository().to_string();
        let version = VersionExpr::display_optional(dep.version.as_ref());
        let lockfile = parent.lockfile_mut();
        if lockfile.contains(&repository, &version) {
            continue;
        }
        lockfile.require.push(dep.lock_requirement(Direction::Indirect));
        debug!(%repository, %version, "locked indirect requirement");
        decisions.push(Decision::Indirect {
            repository,
            version,
        });
    }

    let sum = parent.sum();
    parent.lockfile_mut().sum = sum;
    parent.refresh_module_records();
    Ok(decisions)
}

fn merge_direct(parent: &mut Bundle, dep: &Bundle) -> Result<Decision> {
    let repository = dep.repository().to_string();
    let version = VersionExpr::display_optional(dep.version.as_ref());

    let existing = parent
        .manifest
        .find_requirement(&repository)
        .map(|(index, req)| (index, req.version.clone()));

    let Some((index, old_version)) = existing else {
        parent
            .manifest
            .require
            .push(Requirement::new(&repository, dep.name(), &version));
        upsert_lock(parent.lockfile_mut(), dep, None);
        info!(%repository, %version, "adding requirement");
        return Ok(Decision::Added {
            repository,
            version,
        });
    };

    if old_version == version {
        let lockfile = parent.lockfile_mut();
        if lockfile.contains(&repository, &version) {
            debug!(%repository, %version, "requirement already satisfied");
        } else {
            upsert_lock(lockfile, dep, None);
        }
        return Ok(Decision::Unchanged {
            repository,
            version,
        });
    }

    let older = match (VersionExpr::parse_optional(&old_version)?, &dep.version) {
        (Some(old), Some(new)) => old.greater_than(new)?,
        _ => false,
    };

    parent.manifest.require[index] = Requirement::new(&repository, dep.name(), &version);
    upsert_lock(parent.lockfile_mut(), dep, Some(old_version.as_str()));

    if older {
        warn!(%repository, from = %old_version, to = %version, "installing an older version");
        Ok(Decision::Downgraded {
            repository,
            from: old_version,
            to: version,
        })
    } else {
        info!(%repository, from = %old_version, to = %version, "upgrading");
        Ok(Decision::Upgraded {
            repository,
            from: old_version,
            to: version,
        })
    }
}

/// Write `dep`'s direct lock entry
///
/// Replaces the entry pinned to `replacing` in place when there is one.
/// An entry already pinned to the new version is promoted to direct instead
/// of being duplicated.
fn upsert_lock(lockfile: &mut Lockfile, dep: &Bundle, replacing: Option<&str>) {
    let entry = dep.lock_requirement(Direction::Direct);
    let existing = lockfile.position(&entry.repository, &entry.version);
    let replaced = replacing.and_then(|old| lockfile.position(&entry.repository, old));

    match (replaced, existing) {
        (Some(old), Some(current)) => {
            lockfile.require[old] = entry;
            lockfile.require.remove(current);
        }
        (Some(index), None) | (None, Some(index)) => lockfile.require[index] = entry,
        (None, None) => lockfile.require.push(entry),
    }
}

/// Persist `bundle`'s manifest and lock file into `work_dir`
///
/// Both encodings are staged into temp files beside their targets first; if
/// staging fails nothing is touched. The lock file is then renamed into
/// place, followed by the manifest. Each rename is attempted even if the
/// other failed, and every failure is reported together.
pub fn save(work_dir: &Path, bundle: &Bundle) -> Result<()> {
    let lock_json = match &bundle.lockfile {
        Some(lockfile) => lockfile.to_json()?,
        None => Lockfile::new().to_json()?,
    };
    let manifest_yaml = bundle.manifest.to_yaml()?;

    let staged = [
        (config::LOCK_FILE, lock_json),
        (config::MANIFEST_FILE, manifest_yaml),
    ]
    .into_iter()
    .map(|(name, content)| stage(work_dir, name, &content).map(|file| (name, file)))
    .collect::<Result<Vec<_>>>()?;

    let failures: Vec<RulekitError> = staged
        .into_iter()
        .filter_map(|(name, file)| {
            let target = work_dir.join(name);
            file.persist(&target)
                .map_err(|e| error::fs::write_failed(target.display().to_string(), e.error.to_string()))
                .err()
        })
        .collect();

    if failures.is_empty() {
        debug!(dir = %work_dir.display(), "saved manifest and lock file");
        Ok(())
    } else {
        Err(error::fs::save_failed(failures))
    }
}

fn stage(dir: &Path, name: &str, content: &str) -> Result<NamedTempFile> {
    let target = dir.join(name);
    let write_err = |e: std::io::Error| {
        error::fs::save_failed(vec![error::fs::write_failed(
            target.display().to_string(),
            e.to_string(),
        )])
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    Ok(file)
}
