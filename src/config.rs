// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the manifest file that Dotlink uses to simplify the
//! process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use crate::{link::Roots, path::resolve_against};

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Manifest layout.
///
/// The __manifest__ declares everything Dotlink should do to bootstrap a
/// user's environment: which entries of the source tree get linked where,
/// and which external tools must be present.
///
/// # General Layout
///
/// A manifest is composed of three basic parts: settings, link groups, and
/// tools. The settings section defines the root directories that relative
/// paths resolve against. Each link group declares a set of entries to link,
/// or copy, from the source tree into one or more target directories. Each
/// tool declares an external program that should be installed if missing.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Root directory settings.
    #[serde(default)]
    pub settings: ManifestSettings,

    /// Link groups in declaration order.
    #[serde(rename = "group", default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<LinkGroup>,

    /// External tools in declaration order.
    #[serde(rename = "tool", default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl Manifest {
    /// Check manifest for declarations that can never be planned.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::EmptyName`] if a group or tool has no name.
    /// - Return [`ConfigError::DuplicateGroup`] if two groups share a name.
    /// - Return [`ConfigError::NoTargets`] if a group has no target.
    /// - Return [`ConfigError::ItemsOnExpand`] if an expand group lists items.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { kind: "group" });
            }

            if !seen.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup {
                    group: group.name.clone(),
                });
            }

            if group.targets.is_empty() {
                return Err(ConfigError::NoTargets {
                    group: group.name.clone(),
                });
            }

            if group.mode == GroupMode::Expand && !group.items.is_empty() {
                return Err(ConfigError::ItemsOnExpand {
                    group: group.name.clone(),
                });
            }
        }

        if self.tools.iter().any(|tool| tool.name.trim().is_empty()) {
            return Err(ConfigError::EmptyName { kind: "tool" });
        }

        Ok(())
    }
}

impl FromStr for Manifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut manifest: Manifest = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        let settings = &mut manifest.settings;
        settings.source_root = settings.source_root.as_deref().map(expand).transpose()?;
        settings.home_root = settings.home_root.as_deref().map(expand).transpose()?;
        for group in &mut manifest.groups {
            group.source = expand(&group.source)?;
            group.targets = group
                .targets
                .iter()
                .map(|target| expand(target))
                .collect::<Result<Vec<_>>>()?;
        }

        manifest.validate()?;

        Ok(manifest)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Root directory settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ManifestSettings {
    /// Root of the source tree. Defaults to manifest's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,

    /// Root that targets land in. Defaults to user's home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_root: Option<PathBuf>,
}

impl ManifestSettings {
    /// Resolve root directories.
    ///
    /// Relative roots are resolved against the directory that contains the
    /// manifest. Missing roots fall back to the manifest's directory for the
    /// source tree, and to `home` for targets.
    pub fn roots(&self, manifest_dir: impl AsRef<Path>, home: impl AsRef<Path>) -> Roots {
        let manifest_dir = manifest_dir.as_ref();
        let source = match &self.source_root {
            Some(path) => resolve_against(manifest_dir, path),
            None => resolve_against(manifest_dir, "."),
        };
        let home = match &self.home_root {
            Some(path) => resolve_against(manifest_dir, path),
            None => home.as_ref().to_path_buf(),
        };

        Roots { home, source }
    }
}

/// Declared group of entries to link.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct LinkGroup {
    /// Unique name of group, used in reports.
    pub name: String,

    /// Source directory or file, relative to source root.
    #[serde(default = "current_dir")]
    pub source: PathBuf,

    /// Target directories or files, relative to home root.
    pub targets: Vec<PathBuf>,

    /// Prefix prepended to each item's target name, e.g., ".".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    /// How to link entries of this group.
    #[serde(default)]
    pub mode: GroupMode,

    /// Entries of source directory to link. Empty means source itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,

    /// Create target directory if missing.
    #[serde(default)]
    pub ensure_target_dir: bool,

    /// Expand directories as well as files.
    #[serde(default)]
    pub include_dirs: bool,
}

/// Link mode of a [`LinkGroup`].
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Symlink each item, or the source itself.
    #[default]
    Link,

    /// Symlink each direct child of source directory.
    Expand,

    /// Copy each item, or the source itself, once.
    Copy,
}

/// External tool declaration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ToolDefinition {
    /// Name of tool, used in reports.
    pub name: String,

    /// Program looked up on `PATH` to see if tool is present.
    pub check: String,

    /// Shell command that installs the tool.
    pub install: String,

    /// Shell commands to run once the tool is present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

fn expand(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref().to_string_lossy();
    let expanded = shellexpand::full(path.as_ref()).map_err(ConfigError::ShellExpansion)?;

    Ok(PathBuf::from(expanded.into_owned()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Group or tool has a blank name.
    #[error("{kind} name cannot be empty")]
    EmptyName { kind: &'static str },

    /// Two groups share the same name.
    #[error("group {group:?} is declared more than once")]
    DuplicateGroup { group: String },

    /// Group declares no target to link into.
    #[error("group {group:?} has no targets")]
    NoTargets { group: String },

    /// Expand group lists items, which expansion would ignore.
    #[error("group {group:?} expands its source, so it cannot list items")]
    ItemsOnExpand { group: String },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
