// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::{Component, Path, PathBuf};

/// Name of manifest file looked up in current directory by default.
pub const MANIFEST_FILE_NAME: &str = "dotlink.toml";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine absolute path to user's configuration directory.
///
/// Always `$HOME/.config`, even on platforms where [`dirs::config_dir`]
/// would point somewhere else. Most command-line tools look here regardless
/// of platform.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".config"))
}

/// Default path to the manifest, i.e., `dotlink.toml` in current directory.
pub fn default_manifest_path() -> PathBuf {
    PathBuf::from(MANIFEST_FILE_NAME)
}

/// Resolve `path` against `base` unless it is already absolute.
///
/// The result is lexically normalized, so `.` components vanish and `..`
/// components pop their parent. Nothing touches the file system.
pub fn resolve_against(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(base.as_ref().join(path))
    }
}

/// Lexically normalize a path.
///
/// Used as the fallback when a path cannot be canonicalized through the file
/// system, e.g., because it does not exist.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut normal = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => continue,
            // INVARIANT: Only pop real names, and never climb above root.
            Component::ParentDir => match normal.components().next_back() {
                Some(Component::Normal(_)) => {
                    normal.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => continue,
                _ => normal.push(component),
            },
            other => normal.push(other),
        }
    }

    normal
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
