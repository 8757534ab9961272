//! Command implementations for Rulekit CLI

pub mod check;
pub mod completions;
pub mod get;
pub mod helpers;
pub mod init;
pub mod install;
pub mod verify;
pub mod version;
