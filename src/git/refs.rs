//! Tag and commit lookup in a cloned repository

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use git2::{Commit, ObjectType, Oid, Repository, Tree};

use crate::error::{self, Result};
use crate::version::VersionExpr;

/// The parts of a commit version selection cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: Oid,

    /// Committer time, UTC, whole seconds
    pub time: DateTime<Utc>,
}

impl CommitInfo {
    fn from_commit(commit: &Commit<'_>) -> Self {
        let seconds = commit.time().seconds();
        Self {
            id: commit.id(),
            time: DateTime::from_timestamp(seconds, 0).unwrap_or_default(),
        }
    }

    /// Full hex hash
    pub fn hash(&self) -> String {
        self.id.to_string()
    }

    /// Pseudo-version naming this commit
    pub fn pseudo_version(&self) -> VersionExpr {
        VersionExpr::pseudo(self.time, &self.hash())
    }
}

/// Commit the repository's HEAD points at
pub fn head_commit(repo: &Repository) -> Result<CommitInfo> {
    let commit = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(|e| error::git::operation_failed(format!("cannot resolve HEAD: {}", e.message())))?;
    Ok(CommitInfo::from_commit(&commit))
}

/// Every tag with the commit it points at (annotated tags are peeled)
fn tags(repo: &Repository) -> Result<Vec<(String, CommitInfo)>> {
    let names = repo.tag_names(None)?;
    let mut tags = Vec::new();
    for name in names.iter().flatten() {
        let commit = repo
            .revparse_single(&format!("refs/tags/{name}"))
            .and_then(|obj| obj.peel_to_commit());
        if let Ok(commit) = commit {
            tags.push((name.to_string(), CommitInfo::from_commit(&commit)));
        }
    }
    Ok(tags)
}

/// Tag with the greatest semantic precedence, if any tag is a release version
pub fn latest_tag(repo: &Repository) -> Result<Option<(VersionExpr, CommitInfo)>> {
    let mut best: Option<(VersionExpr, CommitInfo)> = None;
    for (name, commit) in tags(repo)? {
        let Ok(version) = VersionExpr::release(&name) else {
            continue;
        };
        let newer = match &best {
            Some((current, _)) => version.greater_than(current)?,
            None => true,
        };
        if newer {
            best = Some((version, commit));
        }
    }
    Ok(best)
}

/// Commit of the tag named exactly `name`
pub fn find_tag(repo: &Repository, name: &str) -> Result<Option<CommitInfo>> {
    Ok(tags(repo)?
        .into_iter()
        .find(|(tag, _)| tag == name)
        .map(|(_, commit)| commit))
}

/// Commit matching a pseudo-version
///
/// Both must agree: the commit's 12-character short hash is a prefix of the
/// version's hash, and its committer time equals the version's timestamp.
pub fn find_commit_by_pseudo(repo: &Repository, version: &VersionExpr) -> Result<Option<CommitInfo>> {
    let Some(timestamp) = version.timestamp() else {
        return Ok(None);
    };

    let mut walk = repo.revwalk()?;
    if repo.head().is_ok() {
        walk.push_head()?;
    }
    walk.push_glob("refs/tags/*")?;
    walk.push_glob("refs/remotes/*")?;

    for oid in walk {
        let commit = repo.find_commit(oid?)?;
        let info = CommitInfo::from_commit(&commit);
        let hash = info.hash();
        let short = &hash[..crate::version::SHORT_HASH_LEN.min(hash.len())];
        if version.hash().starts_with(short) && info.time == timestamp {
            return Ok(Some(info));
        }
    }
    Ok(None)
}

/// Read every blob in a commit's tree as `/`-separated path to content pairs
pub fn commit_files(repo: &Repository, id: Oid) -> Result<BTreeMap<String, Vec<u8>>> {
    let tree = repo.find_commit(id)?.tree()?;
    let mut files = BTreeMap::new();
    collect_tree(repo, &tree, "", &mut files)?;
    Ok(files)
}

fn collect_tree(
    repo: &Repository,
    tree: &Tree<'_>,
    prefix: &str,
    files: &mut BTreeMap<String, Vec<u8>>,
) -> Result<()> {
    for entry in tree {
        let Some(name) = entry.name() else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        match entry.kind() {
            Some(ObjectType::Tree) => {
                let subtree = repo.find_tree(entry.id())?;
                collect_tree(repo, &subtree, &path, files)?;
            }
            Some(ObjectType::Blob) => {
                let blob = repo.find_blob(entry.id())?;
                files.insert(path, blob.content().to_vec());
            }
            // Submodules
            _ => {}
        }
    }
    Ok(())
}
