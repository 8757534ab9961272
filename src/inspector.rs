//! Bundle integrity checks
//!
//! [`inspect`] is the gate every load goes through: the lock file's `sum`
//! must match the manifest and each module must live where its package says.
//! Per-module content checksums are not part of that gate; they are checked
//! only on request by [`verify_modules`] (`rulekit verify`).

use crate::bundle::Bundle;
use crate::error::{self, Result, RulekitError};
use crate::hash;

/// Run [`verify`] then [`validate`], wrapping the first failure with the
/// bundle's repository
pub fn inspect(bundle: &Bundle) -> Result<()> {
    verify(bundle)
        .and_then(|()| validate(bundle))
        .map_err(|e| error::integrity::inspection_failed(bundle.repository(), e))
}

/// Check the lock file's `sum` against the manifest's checksum
pub fn verify(bundle: &Bundle) -> Result<()> {
    let lockfile = bundle
        .lockfile
        .as_ref()
        .ok_or_else(|| error::integrity::structure_invalid("lock file is missing"))?;

    let actual = bundle.sum();
    if lockfile.sum != actual {
        return Err(error::integrity::checksum_mismatch(&lockfile.sum, actual));
    }
    Ok(())
}

/// Check that descriptors are present and every module's package matches
/// `<bundle name>/<path without extension>`
pub fn validate(bundle: &Bundle) -> Result<()> {
    if bundle.lockfile.is_none() {
        return Err(error::integrity::structure_invalid("lock file is missing"));
    }

    for module in &bundle.modules {
        let expected = module.expected_package(bundle.name());
        if module.package != expected {
            return Err(error::integrity::structure_invalid(format!(
                "module '{}' declares package '{}', expected '{}'",
                module.path, module.package, expected
            )));
        }
    }
    Ok(())
}

/// Compare each module's content with its lock file record
///
/// Every module must have a record with a matching checksum, and every
/// record must still have a module.
pub fn verify_modules(bundle: &Bundle) -> Result<()> {
    let lockfile = bundle
        .lockfile
        .as_ref()
        .ok_or_else(|| error::integrity::structure_invalid("lock file is missing"))?;

    for module in &bundle.modules {
        let matches = lockfile
            .find_module(&module.path)
            .is_some_and(|record| hash::verify_hash(&record.sum, &hash::hash_bytes(&module.content)));
        if !matches {
            return Err(RulekitError::ModuleChecksumMismatch {
                source_path: module.path.clone(),
            });
        }
    }

    if let Some(orphan) = lockfile
        .modules
        .iter()
        .find(|record| !bundle.modules.iter().any(|m| m.path == record.source))
    {
        return Err(error::integrity::structure_invalid(format!(
            "lock file records module '{}' which is not in the bundle",
            orphan.source
        )));
    }
    Ok(())
}
