//! Integration tests for `get`, `tidy` and `install` against local git repositories

mod common;

use common::{RemoteBundle, TestWorkspace};
use predicates::prelude::*;

#[test]
fn test_get_fresh_dependency() {
    let foo = RemoteBundle::new("foo");
    foo.release("v1.0.0", &[], 1_700_000_000);

    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added"));

    let manifest = workspace.read_file("rulekit.yaml");
    assert!(manifest.contains(&format!("repository: {}", foo.source())));
    assert!(manifest.contains("name: foo"));
    assert!(manifest.contains("version: v1.0.0"));

    let rows = workspace.locked(&foo.source());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["direction"], "direct");
    assert_eq!(rows[0]["version"], "v1.0.0");
    assert!(rows[0]["h2"].as_str().unwrap().starts_with("blake3:"));

    workspace.cmd().arg("verify").assert().success();
}

#[test]
fn test_get_latest_picks_highest_tag() {
    let foo = RemoteBundle::new("foo");
    foo.release("v1.2.0", &[], 1_700_000_000);
    foo.release("v1.10.0", &[], 1_700_000_100);
    foo.publish(&[], "unreleased", 1_700_000_200);

    let workspace = TestWorkspace::init("acme/rules");
    workspace.cmd().args(["get", &foo.source()]).assert().success();

    assert_eq!(workspace.locked(&foo.source())[0]["version"], "v1.10.0");
}

#[test]
fn test_get_same_version_twice_is_idempotent() {
    let foo = RemoteBundle::new("foo");
    foo.release("v1.0.0", &[], 1_700_000_000);

    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v1.0.0"])
        .assert()
        .success();
    let manifest = workspace.read_file("rulekit.yaml");
    let lock = workspace.read_file("rulekit.lock");

    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already required"));

    assert_eq!(workspace.read_file("rulekit.yaml"), manifest);
    assert_eq!(workspace.read_file("rulekit.lock"), lock);
}

#[test]
fn test_get_upgrade_and_downgrade() {
    let foo = RemoteBundle::new("foo");
    foo.release("v0.9.0", &[], 1_700_000_000);
    foo.release("v1.0.0", &[], 1_700_000_100);
    foo.release("v2.0.0", &[], 1_700_000_200);

    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v1.0.0"])
        .assert()
        .success();

    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v2.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrading"))
        .stdout(predicate::str::contains("v1.0.0 => v2.0.0"));
    let rows = workspace.locked(&foo.source());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["version"], "v2.0.0");

    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v0.9.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installing an older version"));
    let rows = workspace.locked(&foo.source());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["version"], "v0.9.0");
    assert_eq!(workspace.read_file("rulekit.yaml").matches("name: foo").count(), 1);
}

#[test]
fn test_shared_indirect_dependency_locked_once() {
    let shared = RemoteBundle::new("shared");
    shared.release("v0.1.0", &[], 1_700_000_000);

    let a = RemoteBundle::new("a");
    a.release("v1.0.0", &[(&shared, "v0.1.0")], 1_700_000_000);
    let b = RemoteBundle::new("b");
    b.release("v1.0.0", &[(&shared, "v0.1.0")], 1_700_000_000);

    let workspace = TestWorkspace::init("acme/rules");
    workspace.cmd().args(["get", &a.source()]).assert().success();
    workspace.cmd().args(["get", &b.source()]).assert().success();

    let rows = workspace.locked(&shared.source());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["direction"], "indirect");
    assert_eq!(workspace.locked(&a.source())[0]["direction"], "direct");
    assert_eq!(workspace.locked(&b.source())[0]["direction"], "direct");

    // Rebuilding from scratch gives the same set
    workspace.cmd().arg("tidy").assert().success();
    assert_eq!(workspace.locked(&shared.source()).len(), 1);
    assert_eq!(workspace.lockfile()["require"].as_array().unwrap().len(), 3);
}

#[test]
fn test_get_untagged_repository_uses_pseudo_version() {
    let foo = RemoteBundle::new("foo");
    let head = foo.publish(&[], "untagged", 1_700_000_000);

    let workspace = TestWorkspace::init("acme/rules");
    workspace.cmd().args(["get", &foo.source()]).assert().success();

    let expected = format!("v0.0.0+20231114221320-{}", &head.to_string()[..12]);
    assert_eq!(workspace.locked(&foo.source())[0]["version"], expected.as_str());

    // The pseudo-version resolves again from a cold store
    let other = TestWorkspace::init("acme/other");
    other
        .cmd()
        .args(["get", &foo.source(), "-v", &expected])
        .assert()
        .success();
}

#[test]
fn test_get_missing_version_fails_without_writing() {
    let foo = RemoteBundle::new("foo");
    foo.release("v1.0.0", &[], 1_700_000_000);

    let workspace = TestWorkspace::init("acme/rules");
    let lock = workspace.read_file("rulekit.lock");
    workspace
        .cmd()
        .args(["get", &foo.source(), "-v", "v9.9.9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("version 'v9.9.9' is not found"));
    assert_eq!(workspace.read_file("rulekit.lock"), lock);
}

#[test]
fn test_get_rejects_bundle_with_stale_lock() {
    let foo = RemoteBundle::new("foo");
    foo.publish(&[], "first", 1_700_000_000);
    foo.write(
        "rulekit.yaml",
        &format!("package:\n  name: foo\n  repository: {}\n  description: edited\n", foo.source()),
    );
    let oid = foo.commit(1_700_000_100);
    foo.tag("v1.0.0", oid);

    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["get", &foo.source()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Checksum mismatch"));
}

#[test]
fn test_get_invalid_version_flag() {
    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["get", "github.com/example/foo", "-v", "not-a-version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version 'not-a-version'"));
}

#[test]
fn test_install_populates_store_only() {
    let dep = RemoteBundle::new("dep");
    dep.release("v0.2.0", &[], 1_700_000_000);
    let foo = RemoteBundle::new("foo");
    foo.release("v1.0.0", &[(&dep, "v0.2.0")], 1_700_000_000);

    let workspace = TestWorkspace::new();
    workspace
        .cmd()
        .args(["install", &foo.source()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{}@v0.2.0", dep.source())))
        .stdout(predicate::str::contains(format!("{}@v1.0.0", foo.source())));

    let bundles: Vec<_> = std::fs::read_dir(workspace.cache.join("bundles"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(bundles.len(), 2);
    assert!(bundles.iter().any(|b| b.ends_with("@v1.0.0")));
    assert!(!workspace.file_exists("rulekit.yaml"));
}

#[test]
fn test_store_serves_bundle_after_origin_is_gone() {
    let foo = RemoteBundle::new("foo");
    foo.release("v1.0.0", &[], 1_700_000_000);
    let source = foo.source();

    let workspace = TestWorkspace::init("acme/rules");
    workspace
        .cmd()
        .args(["install", &source, "-v", "v1.0.0"])
        .assert()
        .success();
    drop(foo);

    workspace
        .cmd()
        .args(["get", &source, "-v", "v1.0.0"])
        .assert()
        .success();
    assert_eq!(workspace.locked(&source).len(), 1);
}
