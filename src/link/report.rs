// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reconciliation transcript.
//!
//! Thin reporting layer over reconciliation results. Every decision is
//! logged as soon as it is recorded, grouped by manifest group, so the
//! output reads in the same order as the manifest.

use crate::link::{
    reconcile::{Result, RunMode},
    ConcretePair, CopyOutcome, LinkOutcome, Outcome,
};

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};
use tracing::{error, info, warn};

/// One recorded reconciliation result.
#[derive(Debug)]
pub struct Entry {
    pub pair: ConcretePair,
    pub result: Result<Outcome>,
}

/// Ordered record of a reconciliation run.
#[derive(Debug)]
pub struct Transcript {
    mode: RunMode,
    entries: Vec<Entry>,
}

impl Transcript {
    /// Construct new empty transcript.
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    /// Record and report result of one pair.
    pub fn record(&mut self, pair: ConcretePair, result: Result<Outcome>) {
        let new_group = self
            .entries
            .last()
            .is_none_or(|last| last.pair.group != pair.group);
        if new_group {
            info!("group {}", pair.group);
        }

        self.report(&pair, &result);
        self.entries.push(Entry { pair, result });
    }

    /// All recorded entries in order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Tally outcomes.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            mode: self.mode,
            ..Default::default()
        };

        for entry in &self.entries {
            match &entry.result {
                Ok(Outcome::Link(LinkOutcome::Created)) => summary.created += 1,
                Ok(Outcome::Link(LinkOutcome::AlreadyCorrect)) => summary.correct += 1,
                Ok(Outcome::Link(LinkOutcome::SkippedForeignSymlink { .. })) => {
                    summary.foreign += 1
                }
                Ok(Outcome::Link(LinkOutcome::SkippedExistingFile)) => summary.existing += 1,
                Ok(Outcome::Copy(CopyOutcome::CopiedOnce)) => summary.copied += 1,
                Ok(Outcome::Copy(CopyOutcome::SkippedAlreadyExists)) => summary.kept += 1,
                Err(_) => summary.failed += 1,
            }
        }

        summary
    }

    /// Check if any pair failed.
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|entry| entry.result.is_err())
    }

    fn report(&self, pair: &ConcretePair, result: &Result<Outcome>) {
        let target = pair.target.display();
        let source = pair.source.display();
        let would = match self.mode {
            RunMode::Apply => "",
            RunMode::CheckOnly => "would be ",
        };

        match result {
            Ok(Outcome::Link(LinkOutcome::Created)) => {
                info!("{target} {would}linked to {source}")
            }
            Ok(Outcome::Link(LinkOutcome::AlreadyCorrect)) => {
                info!("{target} already linked")
            }
            Ok(Outcome::Link(LinkOutcome::SkippedForeignSymlink { found })) => warn!(
                "{target} points to {}, expected {source}, skipping",
                found.display()
            ),
            Ok(Outcome::Link(LinkOutcome::SkippedExistingFile)) => {
                warn!("{target} already exists, skipping")
            }
            Ok(Outcome::Copy(CopyOutcome::CopiedOnce)) => {
                info!("{target} {would}copied from {source}")
            }
            Ok(Outcome::Copy(CopyOutcome::SkippedAlreadyExists)) => {
                info!("{target} already exists, leaving it be")
            }
            Err(err) => error!("{}", error_chain(err)),
        }
    }
}

/// Tally of outcomes in a [`Transcript`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub mode: RunMode,
    pub created: usize,
    pub correct: usize,
    pub foreign: usize,
    pub existing: usize,
    pub copied: usize,
    pub kept: usize,
    pub failed: usize,
}

impl Display for Summary {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let (created, copied) = match self.mode {
            RunMode::Apply => ("created", "copied"),
            RunMode::CheckOnly => ("to create", "to copy"),
        };

        write!(
            fmt,
            "{} {created}, {} already linked, {} foreign symlinks, {} existing files, \
            {} {copied}, {} copies kept, {} failed",
            self.created,
            self.correct,
            self.foreign,
            self.existing,
            self.copied,
            self.kept,
            self.failed
        )
    }
}

/// Render error along with every underlying cause.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
