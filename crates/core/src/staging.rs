//! Atomic staging of directory trees.
//!
//! Trees are built in a hidden temporary directory next to their final
//! location and become visible with a single `rename`. Both paths live on
//! the same filesystem, so a reader sees the complete tree or nothing. An
//! interrupted run leaves only the hidden directory behind. The [`TempDir`]
//! guard removes it when it drops; a killed process never drops it, so
//! later runs remove leftovers with [`sweep_abandoned`].

use crate::{Error, Result};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Label of the directory [`replace`] moves a previous tree into.
pub const REPLACED_LABEL: &str = "replaced";

/// Create a hidden staging directory inside `parent`.
///
/// `parent` and its ancestors are created if needed. The directory is
/// removed when the returned guard drops.
///
/// # Errors
///
/// Returns [`Error::Io`] if `parent` or the staging directory cannot be
/// created.
pub fn staging_dir(parent: &Path, label: &str) -> Result<TempDir> {
    std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create directory"))?;
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{label}."))
        .suffix(".tmp")
        .tempdir_in(parent)
        .map_err(|e| Error::io(e, parent, "create staging directory"))?;
    debug!(path = %staging.path().display(), "Created staging directory");
    Ok(staging)
}

/// Move the fully built tree at `staged` to `dest`.
///
/// `dest` must not exist, or must be an empty directory (which is removed
/// first).
///
/// # Errors
///
/// Returns [`Error::Io`] if `dest` is occupied or the rename fails.
pub fn promote(staged: &Path, dest: &Path) -> Result<()> {
    if is_empty_dir(dest) {
        std::fs::remove_dir(dest).map_err(|e| Error::io(e, dest, "remove empty directory"))?;
    }
    std::fs::rename(staged, dest).map_err(|e| Error::io(e, dest, "rename staged install"))?;
    debug!(from = %staged.display(), to = %dest.display(), "Promoted staged tree");
    Ok(())
}

/// Swap the tree at `staged` in for whatever is at `dest`.
///
/// The previous tree is moved aside first and deleted only after the new
/// one is in place. If the second rename fails the previous tree is put
/// back.
///
/// # Errors
///
/// Returns [`Error::Io`] if either rename fails.
pub fn replace(staged: &Path, dest: &Path) -> Result<()> {
    if !dest.exists() || is_empty_dir(dest) {
        return promote(staged, dest);
    }
    let parent = dest
        .parent()
        .ok_or_else(|| Error::configuration(format!("{} has no parent", dest.display())))?;
    let graveyard = staging_dir(parent, REPLACED_LABEL)?;
    let previous = graveyard.path().join("previous");

    std::fs::rename(dest, &previous).map_err(|e| Error::io(e, dest, "move previous install"))?;
    if let Err(source) = std::fs::rename(staged, dest) {
        if let Err(restore) = std::fs::rename(&previous, dest) {
            warn!(
                path = %dest.display(),
                error = %restore,
                "Could not restore previous install"
            );
        }
        return Err(Error::io(source, dest, "rename staged install"));
    }
    debug!(path = %dest.display(), "Replaced previous install");
    Ok(())
}

/// Remove staging directories in `parent` left behind by killed runs.
///
/// Only hidden `.<label>.*.tmp` directories for the given `labels` whose
/// modification time is at least `older_than` ago are removed, so staging
/// directories of installs still running are left alone. Returns how many
/// were removed. Failures are logged and skipped.
pub fn sweep_abandoned(parent: &Path, labels: &[&str], older_than: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(parent) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let ours = name.ends_with(".tmp")
            && labels
                .iter()
                .any(|label| name.starts_with(&format!(".{label}.")));
        if !ours {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_dir() {
            continue;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if !age.is_some_and(|age| age >= older_than) {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Removed abandoned staging directory");
                removed += 1;
            }
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Could not remove abandoned staging directory"
            ),
        }
    }
    removed
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
