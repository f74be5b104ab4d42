// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Link planning.
//!
//! Turn declared manifest groups into [`LinkSpec`] entries, and expand those
//! entries into an ordered listing of [`ConcretePair`] entries. Declaration
//! order is preserved all the way through, so the transcript of a run is
//! reproducible.
//!
//! # Expansion
//!
//! A [`SpecMode::ExpandChildren`] spec only looks at the _top-level_ of its
//! source directory. Child directories are either filtered out, or linked as
//! one whole entry. They are never recursed into. If nested content needs
//! linking, then it must be declared through its own group.

use crate::{
    config::{GroupMode, LinkGroup},
    link::{ConcretePair, LinkSpec, PairAction, Roots, SpecMode},
    path::resolve_against,
};

use std::{fs, io::ErrorKind, path::PathBuf};
use tracing::{debug, instrument, warn};

/// Plan concrete link pairs from declarations.
#[derive(Debug, Clone)]
pub struct Planner {
    roots: Roots,
}

impl Planner {
    /// Construct new planner over given root directories.
    pub fn new(roots: Roots) -> Self {
        Self { roots }
    }

    /// Root directories relative paths resolve against.
    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    /// Translate manifest groups into link specs.
    ///
    /// Each group produces one spec per target and item pair, in that order.
    /// Groups that list no items produce one spec per target for the source
    /// itself. Expand groups produce one expansion spec per target.
    pub fn declare<'a>(&self, groups: impl IntoIterator<Item = &'a LinkGroup>) -> Vec<LinkSpec> {
        let mut specs = Vec::new();
        for group in groups {
            let source_dir = resolve_against(&self.roots.source, &group.source);
            let mode = match group.mode {
                GroupMode::Link => SpecMode::SingleLink,
                GroupMode::Copy => SpecMode::CopyOnce,
                GroupMode::Expand => SpecMode::ExpandChildren {
                    include_dirs: group.include_dirs,
                },
            };
            let spec = |name: &str, source_path: PathBuf, target_path: PathBuf| LinkSpec {
                group: group.name.clone(),
                name: name.to_string(),
                source_path,
                target_path,
                mode,
                ensure_parent: group.ensure_target_dir,
            };

            for target in &group.targets {
                let target_dir = resolve_against(&self.roots.home, target);
                if group.items.is_empty() {
                    specs.push(spec(&group.name, source_dir.clone(), target_dir));
                    continue;
                }

                for item in &group.items {
                    let target_path = target_dir.join(format!("{}{item}", group.prefix));
                    specs.push(spec(item, source_dir.join(item), target_path));
                }
            }
        }

        specs
    }

    /// Expand link specs into concrete pairs.
    ///
    /// Never fails. An expansion root that does not exist, or cannot be read,
    /// yields zero pairs for its spec.
    #[instrument(skip(self, specs), level = "debug")]
    pub fn plan<'a>(&self, specs: impl IntoIterator<Item = &'a LinkSpec>) -> Vec<ConcretePair> {
        let mut pairs = Vec::new();
        for spec in specs {
            let (source, target) = (spec.source_path.clone(), spec.target_path.clone());
            match spec.mode {
                SpecMode::SingleLink => pairs.push(pair_of(spec, source, target, PairAction::Link)),
                SpecMode::CopyOnce => pairs.push(pair_of(spec, source, target, PairAction::Copy)),
                SpecMode::ExpandChildren { include_dirs } => {
                    for child in list_children(spec, include_dirs) {
                        let target = match child.file_name() {
                            Some(name) => spec.target_path.join(name),
                            None => continue,
                        };
                        pairs.push(pair_of(spec, child, target, PairAction::Link));
                    }
                }
            }
        }

        pairs
    }
}

fn pair_of(spec: &LinkSpec, source: PathBuf, target: PathBuf, action: PairAction) -> ConcretePair {
    ConcretePair {
        group: spec.group.clone(),
        source,
        target,
        action,
        ensure_parent: spec.ensure_parent,
    }
}

fn list_children(spec: &LinkSpec, include_dirs: bool) -> Vec<PathBuf> {
    let entries = match fs::read_dir(&spec.source_path) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(
                "expansion root {:?} does not exist, nothing to link",
                spec.source_path.display()
            );
            return Vec::new();
        }
        Err(error) => {
            warn!(
                "cannot read expansion root {:?}: {error}",
                spec.source_path.display()
            );
            return Vec::new();
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(
                    "skipping unreadable entry in {:?}: {error}",
                    spec.source_path.display()
                );
                continue;
            }
        };

        // INVARIANT: Follow symlinks so a linked directory counts as a directory.
        let path = entry.path();
        if !include_dirs && path.is_dir() {
            debug!("skipping directory {:?}", path.display());
            continue;
        }

        children.push(path);
    }

    // INVARIANT: Directory listing order is platform dependent, so sort it.
    children.sort();
    children
}
