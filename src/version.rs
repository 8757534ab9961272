//! Bundle version model
//!
//! A bundle revision is named either by a release tag (`v1.2.3`) or, when no
//! tag applies to the selected commit, by a pseudo-version derived from the
//! commit itself:
//!
//! ```text
//! v0.0.0+20240102150405-0123456789ab
//!        └─ UTC commit ─┘└ short hash ┘
//! ```
//!
//! Releases order by semantic-version precedence, pseudo-versions by commit
//! time. The two classes are never ordered against each other.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use semver::Version;

use crate::error::{self, Result, RulekitError};

/// Length of the abbreviated commit hash carried by pseudo-versions
pub const SHORT_HASH_LEN: usize = 12;

/// Rendering of an unspecified version
pub const LATEST: &str = "latest";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

static PSEUDO_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(v\d+\.\d+\.\d+)\+(\d{14})-(\w+)$").ok());

/// A specific revision of a bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionExpr {
    /// Semantic tag; `0.0.0` for pseudo-versions
    tag: Version,

    /// Tag text as written (keeps the `v` prefix round-trippable)
    original: String,

    /// UTC commit time, set for pseudo-versions
    timestamp: Option<DateTime<Utc>>,

    /// Abbreviated commit hash, set for pseudo-versions
    hash: String,
}

impl VersionExpr {
    /// Parse a version from a manifest or lock file entry
    ///
    /// An empty string is reported as [`RulekitError::EmptyVersion`]; callers
    /// that accept "latest" should go through [`VersionExpr::parse_optional`].
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(RulekitError::EmptyVersion);
        }

        if !input.contains('+') {
            let tag = parse_semver(input)?;
            if is_sentinel(&tag) {
                return Err(error::version::invalid(input));
            }
            return Ok(Self {
                tag,
                original: input.to_string(),
                timestamp: None,
                hash: String::new(),
            });
        }

        let captures = PSEUDO_PATTERN
            .as_ref()
            .and_then(|re| re.captures(input))
            .ok_or_else(|| error::version::invalid(input))?;

        let tag = parse_semver(&captures[1])?;
        if !is_sentinel(&tag) {
            return Err(error::version::invalid(input));
        }

        let naive = NaiveDateTime::parse_from_str(&captures[2], TIMESTAMP_FORMAT)
            .map_err(|_| error::version::invalid(input))?;

        Ok(Self {
            tag,
            original: captures[1].to_string(),
            timestamp: Some(naive.and_utc()),
            hash: captures[3].to_string(),
        })
    }

    /// Parse a version where the empty string means "latest"
    pub fn parse_optional(input: &str) -> Result<Option<Self>> {
        match Self::parse(input) {
            Ok(version) => Ok(Some(version)),
            Err(RulekitError::EmptyVersion) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Build a release version from a tag name
    pub fn release(tag_name: &str) -> Result<Self> {
        let version = Self::parse(tag_name)?;
        if version.is_pseudo() {
            return Err(error::version::invalid(tag_name));
        }
        Ok(version)
    }

    /// Build a pseudo-version from a commit's time and hash
    ///
    /// The hash is abbreviated to [`SHORT_HASH_LEN`] characters and the time
    /// is truncated to whole seconds.
    pub fn pseudo(timestamp: DateTime<Utc>, commit_hash: &str) -> Self {
        let seconds = DateTime::from_timestamp(timestamp.timestamp(), 0).unwrap_or(timestamp);
        Self {
            tag: Version::new(0, 0, 0),
            original: "v0.0.0".to_string(),
            timestamp: Some(seconds),
            hash: commit_hash.chars().take(SHORT_HASH_LEN).collect(),
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Commit time of a pseudo-version
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Short commit hash of a pseudo-version (empty for releases)
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether `self` is strictly newer than `other`
    ///
    /// Fails when one side is a release and the other a pseudo-version.
    pub fn greater_than(&self, other: &Self) -> Result<bool> {
        self.partial_cmp(other)
            .map(|ordering| ordering == Ordering::Greater)
            .ok_or_else(|| {
                let (release, pseudo) = if self.is_pseudo() {
                    (other, self)
                } else {
                    (self, other)
                };
                error::version::mixed_comparison(release.to_string(), pseudo.to_string())
            })
    }

    /// Render an optional version, `None` meaning "latest"
    pub fn display_optional(version: Option<&Self>) -> String {
        version.map_or_else(|| LATEST.to_string(), ToString::to_string)
    }
}

impl PartialOrd for VersionExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.timestamp, other.timestamp) {
            (None, None) => Some(
                self.tag
                    .cmp(&other.tag)
                    .then_with(|| self.original.cmp(&other.original)),
            ),
            (Some(a), Some(b)) => Some(a.cmp(&b).then_with(|| self.hash.cmp(&other.hash))),
            _ => None,
        }
    }
}

impl fmt::Display for VersionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(ts) => write!(
                f,
                "v0.0.0+{}-{}",
                ts.format(TIMESTAMP_FORMAT),
                self.hash
            ),
            None => f.write_str(&self.original),
        }
    }
}

impl std::str::FromStr for VersionExpr {
    type Err = RulekitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_semver(input: &str) -> Result<Version> {
    let bare = input.strip_prefix('v').unwrap_or(input);
    Version::parse(bare).map_err(|_| error::version::invalid(input))
}

fn is_sentinel(tag: &Version) -> bool {
    tag.major == 0 && tag.minor == 0 && tag.patch == 0 && tag.pre.is_empty()
}
