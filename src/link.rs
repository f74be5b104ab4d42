// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Link domain representation.
//!
//! Dotlink converges a user's home directory towards a declared set of
//! symbolic links that point back into a managed __source tree__. The whole
//! process is split into two cooperating pieces.
//!
//! # Planning
//!
//! The [`Planner`] takes the groups declared in the manifest, turns them
//! into [`LinkSpec`] entries, and expands those entries into a flat, ordered
//! listing of [`ConcretePair`] entries. A spec either produces one pair, or
//! one pair per direct child of its source directory. Planning never fails.
//! A missing expansion root simply means that the tool it configures has not
//! been installed yet.
//!
//! # Reconciliation
//!
//! The [`Reconciler`] inspects the current state of each pair's target and
//! decides what to do about it. Reconciliation is conservative by
//! construction. It only ever _adds_ missing links. Existing files and
//! foreign symlinks are reported, never removed or overwritten. Thus, running
//! reconciliation twice in a row yields nothing but
//! [`LinkOutcome::AlreadyCorrect`] the second time around.
//!
//! # See Also
//!
//! 1. [`plan`]
//! 2. [`reconcile`]
//! 3. [`report`]

pub mod plan;
pub mod reconcile;
pub mod report;

pub use plan::Planner;
pub use reconcile::{ReconcileError, Reconciler, RunMode};
pub use report::{Summary, Transcript};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// Root directories that relative manifest paths resolve against.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Roots {
    /// Root of the user's home, i.e., where targets land.
    pub home: PathBuf,

    /// Root of the managed source tree, i.e., what targets point at.
    pub source: PathBuf,
}

impl Roots {
    /// Construct new root listing.
    pub fn new(home: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            source: source.into(),
        }
    }
}

/// How a [`LinkSpec`] should be expanded and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecMode {
    /// Link source path to target path as one whole entry.
    SingleLink,

    /// Link each direct child of source path into target path.
    ExpandChildren {
        /// Keep child directories instead of filtering them out.
        include_dirs: bool,
    },

    /// Copy source file to target path once, and never touch it again.
    CopyOnce,
}

/// Declarative description of what should be linked and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Name of manifest group the spec came from.
    pub group: String,

    /// Logical name of the spec.
    pub name: String,

    /// Absolute path to source entry.
    pub source_path: PathBuf,

    /// Absolute path to target entry.
    pub target_path: PathBuf,

    /// Expansion mode.
    pub mode: SpecMode,

    /// Create parent directory of each target before reconciliation.
    pub ensure_parent: bool,
}

/// What reconciliation should do with a [`ConcretePair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairAction {
    Link,
    Copy,
}

/// One resolved source and target path pair ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcretePair {
    /// Name of manifest group the pair came from.
    pub group: String,

    /// Absolute path to source entry.
    pub source: PathBuf,

    /// Absolute path to target entry.
    pub target: PathBuf,

    /// Link or copy.
    pub action: PairAction,

    /// Create parent directory of target before evaluation.
    pub ensure_parent: bool,
}

impl ConcretePair {
    /// Construct new link pair.
    pub fn link(
        group: impl Into<String>,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            group: group.into(),
            source: source.into(),
            target: target.into(),
            action: PairAction::Link,
            ensure_parent: false,
        }
    }

    /// Construct new copy pair.
    pub fn copy(
        group: impl Into<String>,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            action: PairAction::Copy,
            ..Self::link(group, source, target)
        }
    }

    /// Require parent directory of target to exist before evaluation.
    pub fn with_ensure_parent(mut self, ensure_parent: bool) -> Self {
        self.ensure_parent = ensure_parent;
        self
    }
}

impl Display for ConcretePair {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let arrow = match self.action {
            PairAction::Link => "->",
            PairAction::Copy => "<=",
        };

        write!(
            fmt,
            "[{}] {} {arrow} {}",
            self.group,
            self.target.display(),
            self.source.display()
        )
    }
}

/// Result of reconciling one link pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Symlink was created, or would be created in check-only mode.
    Created,

    /// Target already links to source.
    AlreadyCorrect,

    /// Target is a symlink that points somewhere else.
    SkippedForeignSymlink {
        /// Link value found at target.
        found: PathBuf,
    },

    /// Target exists and is not a symlink.
    SkippedExistingFile,
}

/// Result of reconciling one copy pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Source was copied, or would be copied in check-only mode.
    CopiedOnce,

    /// Target already exists in some form.
    SkippedAlreadyExists,
}

/// Result of reconciling any pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Link(LinkOutcome),
    Copy(CopyOutcome),
}

impl From<LinkOutcome> for Outcome {
    fn from(outcome: LinkOutcome) -> Self {
        Self::Link(outcome)
    }
}

impl From<CopyOutcome> for Outcome {
    fn from(outcome: CopyOutcome) -> Self {
        Self::Copy(outcome)
    }
}
