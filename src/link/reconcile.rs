// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Link reconciliation.
//!
//! Converge the file system towards the state described by a listing of
//! [`ConcretePair`] entries, one pair at a time.
//!
//! # Decision Order
//!
//! Each link pair goes through the following checks. The first check that
//! applies decides the outcome:
//!
//! 1. Source is missing? Fail with [`ReconcileError::MissingSource`].
//! 2. Parent directory of target is missing, and the pair asks for it?
//!    Create it along with any missing ancestors.
//! 3. Target is a symlink? Compare its link value against the source. Same
//!    place means [`LinkOutcome::AlreadyCorrect`], anywhere else means
//!    [`LinkOutcome::SkippedForeignSymlink`].
//! 4. Target exists as anything else? [`LinkOutcome::SkippedExistingFile`].
//! 5. Target is absent? Create the symlink, [`LinkOutcome::Created`].
//!
//! Copy pairs are simpler. An absent target is copied to once and verified,
//! while a target that exists in any form is left alone.
//!
//! Nothing here ever deletes or overwrites an existing file system entry.

use crate::{
    link::{ConcretePair, CopyOutcome, LinkOutcome, Outcome, PairAction, Transcript},
    path::{normalize, resolve_against},
};

use std::{
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Whether reconciliation may touch the file system.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Create directories, symlinks, and copies as needed.
    #[default]
    Apply,

    /// Decide everything, but change nothing.
    CheckOnly,
}

/// Reconcile concrete pairs against the file system.
#[derive(Default, Debug, Clone)]
pub struct Reconciler {
    mode: RunMode,
}

impl Reconciler {
    /// Construct new reconciler.
    pub fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    /// Current run mode.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Reconcile every pair in order, recording each result in a transcript.
    ///
    /// A failing pair never stops the pairs after it.
    pub fn run(&self, pairs: impl IntoIterator<Item = ConcretePair>) -> Transcript {
        let mut transcript = Transcript::new(self.mode);
        for pair in pairs {
            let result = self.apply(&pair);
            transcript.record(pair, result);
        }

        transcript
    }

    /// Reconcile one pair according to its action.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError`] if pair could not be reconciled.
    pub fn apply(&self, pair: &ConcretePair) -> Result<Outcome> {
        match pair.action {
            PairAction::Link => self.reconcile(pair).map(Outcome::from),
            PairAction::Copy => self.copy_once(pair).map(Outcome::from),
        }
    }

    /// Reconcile one link pair.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::MissingSource`] if source does not exist.
    /// - Return [`ReconcileError::DirectoryCreation`] if parent directory of
    ///   target cannot be created.
    /// - Return [`ReconcileError::Inspect`] if target cannot be inspected.
    /// - Return [`ReconcileError::CreateSymlink`] if symlink cannot be made.
    #[instrument(skip(self, pair), fields(target = %pair.target.display()), level = "debug")]
    pub fn reconcile(&self, pair: &ConcretePair) -> Result<LinkOutcome> {
        self.check_source(pair)?;
        self.ensure_parent(pair)?;

        match target_state(&pair.target)? {
            TargetState::Symlink(found) => {
                if points_at(&pair.target, &found, &pair.source) {
                    debug!("symlink already points at {:?}", pair.source.display());
                    Ok(LinkOutcome::AlreadyCorrect)
                } else {
                    debug!("symlink points at {:?} instead", found.display());
                    Ok(LinkOutcome::SkippedForeignSymlink { found })
                }
            }
            TargetState::Other => Ok(LinkOutcome::SkippedExistingFile),
            TargetState::Absent => {
                if self.mode == RunMode::Apply {
                    symlink(&pair.source, &pair.target).map_err(|err| {
                        ReconcileError::CreateSymlink {
                            source: err,
                            target: pair.target.clone(),
                        }
                    })?;
                }

                Ok(LinkOutcome::Created)
            }
        }
    }

    /// Reconcile one copy pair.
    ///
    /// Copies source to target only if target does not exist at all. An
    /// existing target is never compared against source, nor overwritten.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::MissingSource`] if source does not exist.
    /// - Return [`ReconcileError::DirectoryCreation`] if parent directory of
    ///   target cannot be created.
    /// - Return [`ReconcileError::Inspect`] if target cannot be inspected.
    /// - Return [`ReconcileError::Copy`] if source cannot be copied.
    /// - Return [`ReconcileError::CopyVerification`] if copy does not match
    ///   source byte for byte.
    #[instrument(skip(self, pair), fields(target = %pair.target.display()), level = "debug")]
    pub fn copy_once(&self, pair: &ConcretePair) -> Result<CopyOutcome> {
        self.check_source(pair)?;
        self.ensure_parent(pair)?;

        if target_state(&pair.target)? != TargetState::Absent {
            return Ok(CopyOutcome::SkippedAlreadyExists);
        }

        if self.mode == RunMode::CheckOnly {
            return Ok(CopyOutcome::CopiedOnce);
        }

        let copy_error = |err| ReconcileError::Copy {
            source: err,
            target: pair.target.clone(),
        };
        fs::copy(&pair.source, &pair.target).map_err(copy_error)?;

        // INVARIANT: Copy must be byte-identical to its source right after.
        let expect = fs::read(&pair.source).map_err(copy_error)?;
        let result = fs::read(&pair.target).map_err(copy_error)?;
        if expect != result {
            return Err(ReconcileError::CopyVerification {
                target: pair.target.clone(),
            });
        }

        Ok(CopyOutcome::CopiedOnce)
    }

    fn check_source(&self, pair: &ConcretePair) -> Result<()> {
        match pair.source.try_exists() {
            Ok(true) => Ok(()),
            Ok(false) => Err(ReconcileError::MissingSource {
                path: pair.source.clone(),
            }),
            Err(err) => Err(ReconcileError::Inspect {
                source: err,
                path: pair.source.clone(),
            }),
        }
    }

    fn ensure_parent(&self, pair: &ConcretePair) -> Result<()> {
        let parent = match pair.target.parent() {
            Some(parent) if pair.ensure_parent => parent,
            _ => return Ok(()),
        };

        if self.mode == RunMode::CheckOnly {
            if !parent.is_dir() {
                debug!("would create directory {:?}", parent.display());
            }
            return Ok(());
        }

        let created = mkdirp::mkdirp(parent).map_err(|err| ReconcileError::DirectoryCreation {
            source: err,
            path: parent.to_path_buf(),
        })?;
        if let Some(first) = created {
            debug!("created directory {:?}", first.display());
        }

        Ok(())
    }
}

/// Observed state of a target path.
///
/// Symlinks are never followed, so a dangling symlink is a symlink, not an
/// absent entry.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetState {
    Absent,
    Symlink(PathBuf),
    Other,
}

fn target_state(target: &Path) -> Result<TargetState> {
    let inspect_error = |err| ReconcileError::Inspect {
        source: err,
        path: target.to_path_buf(),
    };

    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let found = fs::read_link(target).map_err(inspect_error)?;
            Ok(TargetState::Symlink(found))
        }
        Ok(_) => Ok(TargetState::Other),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(TargetState::Absent),
        Err(err) => Err(inspect_error(err)),
    }
}

/// Check if link value found at target refers to source.
///
/// Relative link values are relative to the directory containing the link.
/// Only the immediate link value counts, so a link to another symlink that
/// happens to lead to source is still foreign.
fn points_at(target: &Path, found: &Path, source: &Path) -> bool {
    let found = match target.parent() {
        Some(parent) => resolve_against(parent, found),
        None => found.to_path_buf(),
    };

    canonical(&found) == canonical(source)
}

/// Canonicalize parent directory of path, but never its final component.
fn canonical(path: &Path) -> PathBuf {
    let path = normalize(path);
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
        _ => path,
    }
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, target)
    } else {
        std::os::windows::fs::symlink_file(source, target)
    }
}

/// Link reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Declared source does not exist.
    #[error("source {:?} does not exist", path.display())]
    MissingSource { path: PathBuf },

    /// Parent directory of target cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    DirectoryCreation {
        #[source]
        source: IoError,
        path: PathBuf,
    },

    /// Path cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Inspect {
        #[source]
        source: IoError,
        path: PathBuf,
    },

    /// Symlink cannot be created at target.
    #[error("failed to create symlink at {:?}", target.display())]
    CreateSymlink {
        #[source]
        source: IoError,
        target: PathBuf,
    },

    /// Source cannot be copied to target.
    #[error("failed to copy to {:?}", target.display())]
    Copy {
        #[source]
        source: IoError,
        target: PathBuf,
    },

    /// Copy at target differs from its source.
    #[error("copy at {:?} does not match its source", target.display())]
    CopyVerification { target: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
