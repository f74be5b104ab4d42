// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Broken symlink cleanup.
//!
//! Link reconciliation never deletes anything. Thus, links whose source was
//! renamed or removed from the source tree pile up over time. This module
//! finds those dangling links so the caller can offer to remove them.
//! Asking the user is left to the caller.

use ignore::WalkBuilder;
use std::{
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Symlink whose destination does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    /// Path of symlink itself.
    pub path: PathBuf,

    /// Link value of symlink.
    pub points_to: PathBuf,
}

/// Find every broken symlink under `root`, recursively.
///
/// Hidden files and ignore files are not special here, and symlinks are
/// never followed. A missing root simply has no broken symlinks. Entries that
/// cannot be read are logged and skipped.
///
/// # Errors
///
/// - Return [`CleanError::ReadLink`] if a symlink cannot be read.
#[instrument(skip(root), level = "debug")]
pub fn find_broken_symlinks(root: impl AsRef<Path>) -> Result<Vec<BrokenLink>> {
    let root = root.as_ref();
    if let Err(err) = fs::symlink_metadata(root) {
        if err.kind() == ErrorKind::NotFound {
            debug!("{:?} does not exist", root.display());
            return Ok(Vec::new());
        }
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|lhs, rhs| lhs.cmp(rhs))
        .build();

    let mut broken = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {:?}: {err}", root.display());
                continue;
            }
        };
        if !entry.path_is_symlink() || entry.path().exists() {
            continue;
        }

        let points_to = fs::read_link(entry.path()).map_err(|err| CleanError::ReadLink {
            source: err,
            path: entry.path().to_path_buf(),
        })?;
        broken.push(BrokenLink {
            path: entry.into_path(),
            points_to,
        });
    }

    Ok(broken)
}

/// Remove broken symlinks.
///
/// Each link is checked again right before removal, so an entry that was
/// repaired or replaced in the meantime is left alone. Returns the number of
/// links actually removed.
///
/// # Errors
///
/// - Return [`CleanError::Remove`] if a symlink cannot be removed.
pub fn remove_broken_symlinks<'a>(
    links: impl IntoIterator<Item = &'a BrokenLink>,
) -> Result<usize> {
    let mut removed = 0;
    for link in links {
        let still_broken = fs::symlink_metadata(&link.path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
            && !link.path.exists();
        if !still_broken {
            debug!("{:?} is no longer broken, skipping", link.path.display());
            continue;
        }

        fs::remove_file(&link.path).map_err(|err| CleanError::Remove {
            source: err,
            path: link.path.clone(),
        })?;
        info!("removed {}", link.path.display());
        removed += 1;
    }

    Ok(removed)
}

/// Broken symlink cleanup error types.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    /// Symlink cannot be read.
    #[error("failed to read symlink {:?}", path.display())]
    ReadLink {
        #[source]
        source: IoError,
        path: PathBuf,
    },

    /// Symlink cannot be removed.
    #[error("failed to remove symlink {:?}", path.display())]
    Remove {
        #[source]
        source: IoError,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = CleanError> = std::result::Result<T, E>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::os::unix::fs::{PermissionsExt, symlink};

    #[sealed_test]
    fn find_only_dangling_links() -> anyhow::Result<()> {
        let root = std::env::current_dir()?.join(".config");
        fs::create_dir_all(root.join("kitty/themes"))?;
        fs::write(root.join("kitty/kitty.conf"), "font_size 12")?;
        symlink(root.join("kitty/kitty.conf"), root.join("kitty/alive.conf"))?;
        symlink(root.join("gone.toml"), root.join("starship.toml"))?;
        symlink("../missing.conf", root.join("kitty/themes/.hidden.conf"))?;

        let result = find_broken_symlinks(&root)?;
        let expect = vec![
            BrokenLink {
                path: root.join("kitty/themes/.hidden.conf"),
                points_to: PathBuf::from("../missing.conf"),
            },
            BrokenLink {
                path: root.join("starship.toml"),
                points_to: root.join("gone.toml"),
            },
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test]
    fn unreadable_directory_does_not_abort_scan() -> anyhow::Result<()> {
        let root = std::env::current_dir()?.join(".config");
        let locked = root.join("locked");
        fs::create_dir_all(&locked)?;
        fs::write(locked.join("secret.conf"), "token")?;
        symlink(root.join("gone.toml"), root.join("starship.toml"))?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        let result = find_broken_symlinks(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        let expect = vec![BrokenLink {
            path: root.join("starship.toml"),
            points_to: root.join("gone.toml"),
        }];
        assert_eq!(result?, expect);

        Ok(())
    }

    #[sealed_test]
    fn missing_root_has_nothing_broken() -> anyhow::Result<()> {
        let root = std::env::current_dir()?.join("nowhere");
        assert_eq!(find_broken_symlinks(root)?, Vec::new());

        Ok(())
    }

    #[sealed_test]
    fn remove_only_still_broken_links() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        symlink(root.join("gone"), root.join("a"))?;
        symlink(root.join("later"), root.join("b"))?;

        let links = find_broken_symlinks(&root)?;
        assert_eq!(links.len(), 2);

        // Repaired between discovery and removal.
        fs::write(root.join("later"), "here now")?;

        assert_eq!(remove_broken_symlinks(&links)?, 1);
        assert!(fs::symlink_metadata(root.join("a")).is_err());
        assert!(fs::symlink_metadata(root.join("b")).is_ok());

        Ok(())
    }
}
