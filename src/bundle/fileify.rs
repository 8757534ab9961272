//! Decoding raw bundle files into a [`Bundle`]
//!
//! Bundles reach us as path to content pairs, whether read from a working
//! directory, a store entry or a git commit tree. This module turns those
//! pairs into the manifest, lock file and module structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use walkdir::WalkDir;

use super::{Bundle, ModuleFile};
use crate::config::{self, Lockfile, Manifest};
use crate::error::{self, Result, RulekitError};

/// Top-level directory names excluded from bundle content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    dirs: Vec<String>,
}

impl IgnoreRules {
    /// Parse a newline-delimited ignore file
    pub fn parse(content: &str) -> Self {
        let dirs = content
            .lines()
            .map(|line| line.trim().trim_matches('/'))
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(ToString::to_string)
            .collect();
        Self { dirs }
    }

    pub fn encode(&self) -> String {
        self.dirs.iter().map(|d| format!("{d}\n")).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Whether a `/`-separated bundle path lives under an ignored directory
    pub fn is_ignored(&self, path: &str) -> bool {
        match path.split_once('/') {
            Some((top, _)) => self.dirs.iter().any(|d| d == top),
            None => false,
        }
    }
}

/// Decode path to content pairs into a bundle
///
/// The manifest is required; the lock file is optional. Every `*.rule` file
/// outside an ignored directory becomes a module; all remaining files are
/// carried along untouched.
pub fn fileify(source_name: &str, mut files: BTreeMap<String, Vec<u8>>) -> Result<Bundle> {
    let ignore = files
        .remove(config::IGNORE_FILE)
        .map(|raw| IgnoreRules::parse(&String::from_utf8_lossy(&raw)))
        .unwrap_or_default();

    let manifest_raw =
        files
            .remove(config::MANIFEST_FILE)
            .ok_or_else(|| RulekitError::ManifestDecodeFailed {
                source_name: source_name.to_string(),
                reason: format!("{} is missing", config::MANIFEST_FILE),
            })?;
    let manifest = std::str::from_utf8(&manifest_raw)
        .map_err(|e| e.to_string())
        .and_then(|text| Manifest::from_yaml(text).map_err(|e| e.to_string()))
        .map_err(|reason| RulekitError::ManifestDecodeFailed {
            source_name: source_name.to_string(),
            reason,
        })?;

    let lockfile = match files.remove(config::LOCK_FILE) {
        Some(raw) => Some(
            std::str::from_utf8(&raw)
                .map_err(|e| e.to_string())
                .and_then(|text| Lockfile::from_json(text).map_err(|e| e.to_string()))
                .map_err(|reason| RulekitError::LockfileDecodeFailed {
                    source_name: source_name.to_string(),
                    reason,
                })?,
        ),
        None => None,
    };

    let mut modules = Vec::new();
    let mut others = BTreeMap::new();
    for (path, content) in files {
        if ignore.is_ignored(&path) {
            continue;
        }
        if is_module_path(&path) {
            modules.push(decode_module(path, content)?);
        } else {
            others.insert(path, content);
        }
    }

    Ok(Bundle {
        version: None,
        origin: None,
        manifest,
        lockfile,
        modules,
        ignore,
        others,
    })
}

fn is_module_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext == config::MODULE_EXTENSION)
}

/// Read the `package` and `import` header lines of a module
///
/// The header ends at the first line that is neither blank, a `#` comment,
/// a `package` line nor an `import` line.
fn decode_module(path: String, content: Vec<u8>) -> Result<ModuleFile> {
    let text = std::str::from_utf8(&content).map_err(|e| RulekitError::ModuleDecodeFailed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let mut package = None;
    let mut require = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("package ") {
            if package.is_some() {
                return Err(RulekitError::ModuleDecodeFailed {
                    path,
                    reason: "more than one package declaration".to_string(),
                });
            }
            package = Some(unquote(rest).to_string());
        } else if let Some(rest) = line.strip_prefix("import ") {
            require.push(unquote(rest).to_string());
        } else {
            break;
        }
    }

    let package = package.ok_or_else(|| RulekitError::ModuleDecodeFailed {
        path: path.clone(),
        reason: "missing package declaration".to_string(),
    })?;

    Ok(ModuleFile {
        path,
        content,
        package,
        require,
    })
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

/// Read every file under `root` as `/`-separated relative paths
///
/// The `.git` directory is skipped.
pub fn read_directory(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| {
            error::fs::read_failed(root.display().to_string(), e.to_string())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let key = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        let content = fs::read(entry.path()).map_err(|e| {
            error::fs::read_failed(entry.path().display().to_string(), e.to_string())
        })?;
        files.insert(key, content);
    }

    Ok(files)
}

/// Write path to content pairs under `root`, creating directories as needed
pub fn write_files<'a>(
    root: &Path,
    files: impl IntoIterator<Item = (&'a String, &'a Vec<u8>)>,
) -> Result<()> {
    for (path, content) in files {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                error::fs::write_failed(parent.display().to_string(), e.to_string())
            })?;
        }
        fs::write(&target, content)
            .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(p, c)| ((*p).to_string(), c.as_bytes().to_vec()))
            .collect()
    }

    const MANIFEST: &str = "package:\n  name: acme/rules\n";

    #[test]
    fn test_fileify_decodes_modules() {
        let bundle = fileify(
            "acme",
            files(&[
                ("rulekit.yaml", MANIFEST),
                (
                    "net/fw.rule",
                    "# firewall\npackage acme/rules/net/fw\nimport example/foo/base\nimport \"example/bar\"\n\nrule deny { false }\nimport not/a/header\n",
                ),
                ("README.md", "hello"),
            ]),
        )
        .unwrap();

        assert_eq!(bundle.name(), "acme/rules");
        assert!(bundle.lockfile.is_none());
        assert_eq!(bundle.modules.len(), 1);
        assert_eq!(bundle.modules[0].package, "acme/rules/net/fw");
        assert_eq!(
            bundle.modules[0].require,
            vec!["example/foo/base", "example/bar"]
        );
        assert!(bundle.others.contains_key("README.md"));
    }

    #[test]
    fn test_fileify_requires_manifest() {
        let err = fileify("acme", files(&[("a.rule", "package acme/a\n")])).unwrap_err();
        assert!(matches!(err, RulekitError::ManifestDecodeFailed { .. }));
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn test_fileify_rejects_bad_lockfile() {
        let err = fileify(
            "acme",
            files(&[("rulekit.yaml", MANIFEST), ("rulekit.lock", "nope")]),
        )
        .unwrap_err();
        assert!(matches!(err, RulekitError::LockfileDecodeFailed { .. }));
    }

    #[test]
    fn test_fileify_module_without_package() {
        let err = fileify(
            "acme",
            files(&[("rulekit.yaml", MANIFEST), ("a.rule", "rule x { true }\n")]),
        )
        .unwrap_err();
        assert!(matches!(err, RulekitError::ModuleDecodeFailed { .. }));
    }

    #[test]
    fn test_fileify_honours_ignore_file() {
        let bundle = fileify(
            "acme",
            files(&[
                ("rulekit.yaml", MANIFEST),
                (".rulekitignore", "testdata\n# comment\nvendor/\n"),
                ("testdata/broken.rule", "not a module"),
                ("vendor/x.txt", "x"),
                ("testdata.rule", "package acme/rules/testdata\n"),
            ]),
        )
        .unwrap();
        assert_eq!(bundle.modules.len(), 1);
        assert!(bundle.others.is_empty());
        assert!(bundle.ignore.is_ignored("testdata/broken.rule"));
        assert!(!bundle.ignore.is_ignored("testdata.rule"));
        assert_eq!(bundle.ignore.encode(), "testdata\nvendor\n");
    }

    #[test]
    fn test_read_and_write_directory() {
        let temp = TempDir::new().unwrap();
        let written = files(&[("rulekit.yaml", MANIFEST), ("a/b/c.rule", "package acme/rules/a/b/c\n")]);
        write_files(temp.path(), &written).unwrap();
        std::fs::create_dir_all(temp.path().join(".git")).unwrap();
        std::fs::write(temp.path().join(".git/HEAD"), "ref").unwrap();

        let read = read_directory(temp.path()).unwrap();
        assert_eq!(read, written);
    }
}
