//! Git transport for fetching bundles
//!
//! This module handles:
//! - Turning a bundle source into a clonable URL
//! - Cloning repositories (HTTPS, SSH and local paths) into scratch directories
//! - Enumerating tags and commits, and reading a commit's files ([`refs`])
//!
//! Authentication is delegated entirely to git's native system:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers

pub mod refs;

use std::borrow::Cow;
use std::path::Path;

use git2::{Cred, CredentialType, ErrorClass, FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};
use tracing::debug;

use crate::error::{self, Result};

pub use refs::{commit_files, find_commit_by_pseudo, find_tag, head_commit, latest_tag};

/// Build the URL to clone for a bundle source
///
/// Sources with a scheme, SCP-style SSH sources and absolute paths are used
/// verbatim; anything else is treated as an HTTPS host path, e.g.
/// `github.com/example/foo` -> `https://github.com/example/foo.git`.
pub fn clone_url(source: &str) -> String {
    if source.contains("://") || source.starts_with("git@") || Path::new(source).is_absolute() {
        return source.to_string();
    }
    let trimmed = source.trim_end_matches('/');
    if trimmed.ends_with(".git") {
        format!("https://{trimmed}")
    } else {
        format!("https://{trimmed}.git")
    }
}

/// Normalize SSH URLs from SCP-style (git@host:path) to ssh:// format.
///
/// libgit2 may have issues with SCP-style SSH URLs, so we convert them to
/// the explicit ssh:// format.
fn normalize_ssh_url(url: &str) -> Cow<'_, str> {
    if !url.starts_with("git@") {
        return Cow::Borrowed(url);
    }

    match url.split_once(':') {
        Some((host, path)) => {
            let path = path.strip_prefix('/').unwrap_or(path);
            Cow::Owned(format!("ssh://{host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Interpret a git2 error and provide a more user-friendly message
fn interpret_git_error(err: &git2::Error) -> String {
    let class = err.class();
    let message = err.message().to_lowercase();

    // More specific patterns first
    if message.contains("not found") || message.contains("404") {
        "Repository not found".to_string()
    } else if message.contains("too many redirects") || message.contains("authentication replays") {
        "Repository not found".to_string()
    } else if message.contains("authentication") || message.contains("credentials") {
        "Authentication failed".to_string()
    } else if message.contains("permission denied") || message.contains("access denied") {
        "Permission denied".to_string()
    } else if message.contains("connection")
        || message.contains("network")
        || message.contains("timed out")
    {
        "Network error".to_string()
    } else if class == ErrorClass::Http {
        format!("HTTP error: {}", err.message())
    } else if class == ErrorClass::Ssh {
        format!("SSH error: {}", err.message())
    } else {
        err.message().to_string()
    }
}

/// Clone a bundle source into `target`
///
/// A full clone is made: version selection needs every tag and every
/// commit reachable from them.
pub fn clone(source: &str, target: &Path) -> Result<Repository> {
    let url = clone_url(source);
    debug!(source, url = %url, target = %target.display(), "cloning");

    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    fetch_options.download_tags(git2::AutotagOption::All);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);

    builder
        .clone(normalize_ssh_url(&url).as_ref(), target)
        .map_err(|e| error::git::clone_failed(url.clone(), interpret_git_error(&e)))
}

/// Set up authentication callbacks for git operations
///
/// Tries, in order: default credentials, the SSH agent, common SSH key
/// files, and git credential helpers.
fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
                for key_name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let private_key = ssh_dir.join(key_name);
                    if !private_key.exists() {
                        continue;
                    }
                    let public_key = ssh_dir.join(format!("{key_name}.pub"));
                    let public_key = public_key.exists().then_some(public_key.as_path());
                    if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None) {
                        return Ok(cred);
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }

            // Lets public HTTPS repos through to the server's real answer
            if let Ok(cred) = Cred::userpass_plaintext("", "") {
                return Ok(cred);
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}
