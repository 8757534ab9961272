//! Common test utilities for Rulekit integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use git2::{IndexAddOption, Oid, Repository, Signature, Time};
use tempfile::TempDir;

/// Command for the real rulekit binary
// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn rulekit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("rulekit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A working bundle directory plus a private store for one test
pub struct TestWorkspace {
    pub temp: TempDir,
    /// Working bundle root
    pub path: PathBuf,
    /// Local store root
    pub cache: PathBuf,
}

impl TestWorkspace {
    /// Create an empty workspace (no manifest yet)
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("work");
        let cache = temp.path().join("cache");
        std::fs::create_dir_all(&path).expect("Failed to create work directory");
        Self { temp, path, cache }
    }

    /// Create a workspace and run `rulekit init <name>` in it
    pub fn init(name: &str) -> Self {
        let workspace = Self::new();
        workspace.cmd().args(["init", name]).assert().success();
        workspace
    }

    /// rulekit command bound to this workspace and its store
    pub fn cmd(&self) -> Command {
        let mut cmd = rulekit_cmd();
        cmd.arg("--work-dir")
            .arg(&self.path)
            .arg("--cache-dir")
            .arg(&self.cache);
        cmd
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Parsed rulekit.lock
    pub fn lockfile(&self) -> serde_json::Value {
        serde_json::from_str(&self.read_file("rulekit.lock")).expect("Failed to parse lock file")
    }

    /// Lock file requirement rows for `repository`
    pub fn locked(&self, repository: &str) -> Vec<serde_json::Value> {
        self.lockfile()["require"]
            .as_array()
            .expect("require is an array")
            .iter()
            .filter(|r| r["repository"] == repository)
            .cloned()
            .collect()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A git repository publishing one bundle
///
/// Bundles are locked with the real binary (`rulekit tidy`), so their
/// checksums are whatever rulekit itself computes.
pub struct RemoteBundle {
    pub temp: TempDir,
    pub repo: Repository,
    /// Bundle name, also the module package prefix
    pub name: String,
    cache: TempDir,
}

impl RemoteBundle {
    pub fn new(name: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let repo = Repository::init(temp.path()).expect("Failed to init repository");
        let cache = TempDir::new().expect("Failed to create temp directory");
        Self {
            temp,
            repo,
            name: name.to_string(),
            cache,
        }
    }

    /// Source string for `get`/`install` and for manifests requiring this bundle
    pub fn source(&self) -> String {
        self.temp.path().display().to_string()
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write the manifest and one module, lock with rulekit, commit at `seconds`
    pub fn publish(&self, requires: &[(&RemoteBundle, &str)], description: &str, seconds: i64) -> Oid {
        let mut manifest = format!(
            "package:\n  name: {}\n  repository: {}\n  description: {}\n",
            self.name,
            self.source(),
            description
        );
        if !requires.is_empty() {
            manifest.push_str("require:\n");
            for (dep, version) in requires {
                manifest.push_str(&format!(
                    "- repository: {}\n  name: {}\n  version: {}\n",
                    dep.source(),
                    dep.name,
                    version
                ));
            }
        }
        self.write("rulekit.yaml", &manifest);
        self.write(
            "main.rule",
            &format!("package {}/main\n\nrule allow {{ true }}\n", self.name),
        );

        #[allow(deprecated)]
        Command::cargo_bin("rulekit")
            .unwrap()
            .arg("--cache-dir")
            .arg(self.cache.path())
            .arg("tidy")
            .arg(self.path())
            .assert()
            .success();

        self.commit(seconds)
    }

    pub fn write(&self, path: &str, content: &str) {
        let file_path = self.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(file_path, content).expect("Failed to write file");
    }

    /// Stage everything and commit at `seconds` (UTC epoch)
    pub fn commit(&self, seconds: i64) -> Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        let sig = Signature::new("Test", "test@test.com", &Time::new(seconds, 0)).unwrap();
        let parents = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<_> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, "publish", &tree, &parent_refs)
            .unwrap()
    }

    pub fn tag(&self, name: &str, oid: Oid) {
        let obj = self.repo.find_object(oid, None).unwrap();
        self.repo.tag_lightweight(name, &obj, false).unwrap();
    }

    /// Publish and tag in one step
    pub fn release(&self, tag: &str, requires: &[(&RemoteBundle, &str)], seconds: i64) -> Oid {
        let oid = self.publish(requires, tag, seconds);
        self.tag(tag, oid);
        oid
    }
}
