//! Bundle manifest (rulekit.yaml) data structures

use serde::{Deserialize, Serialize};

use crate::error::{Result, RulekitError};
use crate::hash;

/// Bundle manifest from rulekit.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Manifest {
    /// Bundle identity
    pub package: Package,

    /// Direct requirements, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<Requirement>,
}

/// The `package` block of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Package {
    /// Bundle name, also the package prefix of every module (e.g. "acme/rules")
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<String>,

    /// Repository the bundle is published from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A direct requirement declared in rulekit.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Repository the dependency is fetched from
    pub repository: String,

    /// Dependency bundle name
    pub name: String,

    /// Pinned version (release tag or pseudo-version)
    pub version: String,
}

impl Requirement {
    pub fn new(
        repository: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Manifest {
    /// Create a manifest for a new bundle
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            package: Package {
                name: name.into(),
                ..Package::default()
            },
            require: Vec::new(),
        }
    }

    /// Parse manifest from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize manifest to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate manifest contents
    pub fn validate(&self) -> Result<()> {
        let name = &self.package.name;
        if name.is_empty() || name.starts_with('/') || name.ends_with('/') {
            return Err(RulekitError::ManifestDecodeFailed {
                source_name: name.clone(),
                reason: format!("invalid package name '{name}'"),
            });
        }

        for req in &self.require {
            if req.repository.is_empty() || req.name.is_empty() {
                return Err(RulekitError::ManifestDecodeFailed {
                    source_name: name.clone(),
                    reason: "requirement must name a repository and a bundle".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Find the requirement for a repository, with its position
    pub fn find_requirement(&self, repository: &str) -> Option<(usize, &Requirement)> {
        self.require
            .iter()
            .enumerate()
            .find(|(_, r)| r.repository == repository)
    }

    /// Canonical checksum of the manifest's structure
    ///
    /// Independent of YAML formatting: every field is written in a fixed order,
    /// each terminated by a NUL byte, and the result hashed with SHA-256.
    pub fn sum(&self) -> String {
        hash::sha256_hex(&self.canonical_bytes())
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut field = |key: &str, value: &str| {
            out.extend_from_slice(key.as_bytes());
            out.push(b'=');
            out.extend_from_slice(value.as_bytes());
            out.push(0);
        };

        field("package.name", &self.package.name);
        for author in &self.package.author {
            field("package.author", author);
        }
        field("package.repository", &self.package.repository);
        field("package.description", &self.package.description);
        for req in &self.require {
            field("require.repository", &req.repository);
            field("require.name", &req.name);
            field("require.version", &req.version);
        }
        out
    }
}
