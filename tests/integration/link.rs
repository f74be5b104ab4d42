// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

#![cfg(unix)]

use crate::TreeFixture;

use anyhow::Result;
use dotlink::link::{
    CopyOutcome, LinkOutcome, Outcome, ReconcileError, RunMode, Summary, Transcript,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{fs, os::unix::fs::symlink, path::PathBuf};

fn outcomes(transcript: &Transcript) -> Vec<(PathBuf, Option<Outcome>)> {
    transcript
        .entries()
        .iter()
        .map(|entry| (entry.pair.target.clone(), entry.result.as_ref().ok().cloned()))
        .collect()
}

const DOTFILES: &str = indoc! {r#"
    [[group]]
    name = "dotfiles"
    targets = ["."]
    prefix = "."
    items = ["gitconfig", "zshrc"]

    [[group]]
    name = "starship"
    source = "config/starship.toml"
    targets = [".config/starship.toml"]
    ensure_target_dir = true

    [[group]]
    name = "nvim"
    source = "config/nvim"
    targets = [".config/nvim"]
    mode = "expand"
    ensure_target_dir = true
    include_dirs = true
"#};

fn dotfiles_tree() -> Result<TreeFixture> {
    let tree = TreeFixture::new()?;
    tree.source_file("gitconfig", "[user]\n\tname = John Doe")?;
    tree.source_file("zshrc", "export EDITOR=nvim")?;
    tree.source_file("config/starship.toml", "add_newline = false")?;
    tree.source_file("config/nvim/init.lua", "require('config')")?;
    tree.source_file("config/nvim/lua/config.lua", "return {}")?;

    Ok(tree)
}

#[sealed_test]
fn gitconfig_is_created_then_already_correct() -> Result<()> {
    let tree = TreeFixture::new()?;
    let source = tree.source_file("gitconfig", "[user]")?;
    let manifest = indoc! {r#"
        [[group]]
        name = "gitconfig"
        targets = ["."]
        prefix = "."
        items = ["gitconfig"]
    "#};

    let transcript = tree.run(manifest, RunMode::Apply)?;
    let target = tree.home_path(".gitconfig");
    assert_eq!(
        outcomes(&transcript),
        vec![(target.clone(), Some(LinkOutcome::Created.into()))]
    );
    assert_eq!(fs::read_link(&target)?, source);

    let transcript = tree.run(manifest, RunMode::Apply)?;
    assert_eq!(
        outcomes(&transcript),
        vec![(target.clone(), Some(LinkOutcome::AlreadyCorrect.into()))]
    );
    assert_eq!(fs::read_link(&target)?, source);

    Ok(())
}

#[sealed_test]
fn second_run_converges_without_mutation() -> Result<()> {
    let tree = dotfiles_tree()?;

    let first = tree.run(DOTFILES, RunMode::Apply)?;
    assert!(!first.has_failures());
    assert_eq!(first.summary().created, 5);

    let before = fs::read_dir(tree.home_path(".config/nvim"))?.count();
    let second = tree.run(DOTFILES, RunMode::Apply)?;
    let expect = Summary {
        correct: 5,
        ..Default::default()
    };
    assert_eq!(second.summary(), expect);
    assert_eq!(fs::read_dir(tree.home_path(".config/nvim"))?.count(), before);

    // Directories are linked whole, never recursed into.
    assert_eq!(
        fs::read_link(tree.home_path(".config/nvim/lua"))?,
        tree.source_path("config/nvim/lua")
    );

    Ok(())
}

#[sealed_test]
fn existing_files_are_preserved() -> Result<()> {
    let tree = dotfiles_tree()?;
    let zshrc = tree.home_file(".zshrc", "my own zshrc")?;

    let transcript = tree.run(DOTFILES, RunMode::Apply)?;
    let result = outcomes(&transcript)
        .into_iter()
        .find(|(target, _)| *target == zshrc)
        .and_then(|(_, outcome)| outcome);
    assert_eq!(result, Some(LinkOutcome::SkippedExistingFile.into()));
    assert!(!fs::symlink_metadata(&zshrc)?.file_type().is_symlink());
    assert_eq!(fs::read_to_string(&zshrc)?, "my own zshrc");

    Ok(())
}

#[sealed_test]
fn foreign_gitconfig_symlink_is_left_pointing_elsewhere() -> Result<()> {
    let tree = dotfiles_tree()?;
    let other = tree.outside_file("other/gitconfig")?;
    symlink(&other, tree.home_path(".gitconfig"))?;

    let transcript = tree.run(DOTFILES, RunMode::Apply)?;
    assert_eq!(
        outcomes(&transcript)[0],
        (
            tree.home_path(".gitconfig"),
            Some(LinkOutcome::SkippedForeignSymlink { found: other.clone() }.into())
        )
    );
    assert_eq!(fs::read_link(tree.home_path(".gitconfig"))?, other);

    Ok(())
}

#[sealed_test]
fn fan_out_targets_are_independent() -> Result<()> {
    let tree = TreeFixture::new()?;
    let skill = tree.source_file("skills/review/SKILL.md", "# Review")?;
    let skill_dir = skill.parent().map(PathBuf::from).unwrap_or_default();
    let manifest = indoc! {r#"
        [[group]]
        name = "skills"
        source = "skills"
        targets = [".claude/skills", ".codex/skills"]
        mode = "expand"
        ensure_target_dir = true
        include_dirs = true
    "#};

    let elsewhere = tree.outside_file("elsewhere/review")?;
    fs::create_dir_all(tree.home_path(".codex/skills"))?;
    symlink(&elsewhere, tree.home_path(".codex/skills/review"))?;

    let transcript = tree.run(manifest, RunMode::Apply)?;
    let expect = vec![
        (
            tree.home_path(".claude/skills/review"),
            Some(LinkOutcome::Created.into()),
        ),
        (
            tree.home_path(".codex/skills/review"),
            Some(LinkOutcome::SkippedForeignSymlink { found: elsewhere }.into()),
        ),
    ];
    assert_eq!(outcomes(&transcript), expect);
    assert_eq!(fs::read_link(tree.home_path(".claude/skills/review"))?, skill_dir);

    Ok(())
}

#[sealed_test]
fn missing_expansion_root_plans_nothing() -> Result<()> {
    let tree = TreeFixture::new()?;
    let manifest = indoc! {r#"
        [[group]]
        name = "ghostty"
        source = "config/ghostty"
        targets = [".config/ghostty"]
        mode = "expand"
        ensure_target_dir = true
    "#};

    let transcript = tree.run(manifest, RunMode::Apply)?;
    assert!(transcript.entries().is_empty());
    assert!(!transcript.has_failures());
    assert!(!tree.home_path(".config").exists());

    Ok(())
}

#[sealed_test]
fn missing_source_does_not_stop_other_pairs() -> Result<()> {
    let tree = TreeFixture::new()?;
    tree.source_file("zshrc", "export EDITOR=nvim")?;
    let manifest = indoc! {r#"
        [[group]]
        name = "dotfiles"
        targets = ["."]
        prefix = "."
        items = ["gemrc", "zshrc"]
    "#};

    let transcript = tree.run(manifest, RunMode::Apply)?;
    let entries = transcript.entries();
    assert!(matches!(
        &entries[0].result,
        Err(ReconcileError::MissingSource { .. })
    ));
    assert!(matches!(
        &entries[1].result,
        Ok(Outcome::Link(LinkOutcome::Created))
    ));
    assert!(transcript.has_failures());
    assert_eq!(transcript.summary().failed, 1);

    Ok(())
}

#[sealed_test]
fn settings_are_copied_exactly_once() -> Result<()> {
    let tree = TreeFixture::new()?;
    let source = tree.source_file("claude/settings.json", r#"{"model":"default"}"#)?;
    let manifest = indoc! {r#"
        [[group]]
        name = "claude"
        source = "claude"
        targets = [".claude"]
        mode = "copy"
        items = ["settings.json"]
        ensure_target_dir = true
    "#};
    let target = tree.home_path(".claude/settings.json");

    let transcript = tree.run(manifest, RunMode::Apply)?;
    assert_eq!(
        outcomes(&transcript),
        vec![(target.clone(), Some(CopyOutcome::CopiedOnce.into()))]
    );
    assert_eq!(fs::read(&target)?, fs::read(&source)?);

    fs::write(&target, r#"{"model":"mutated"}"#)?;
    let transcript = tree.run(manifest, RunMode::Apply)?;
    assert_eq!(
        outcomes(&transcript),
        vec![(target.clone(), Some(CopyOutcome::SkippedAlreadyExists.into()))]
    );
    assert_eq!(fs::read_to_string(&target)?, r#"{"model":"mutated"}"#);

    Ok(())
}

#[sealed_test]
fn check_only_run_mutates_nothing() -> Result<()> {
    let tree = dotfiles_tree()?;

    let transcript = tree.run(DOTFILES, RunMode::CheckOnly)?;
    assert_eq!(transcript.summary().created, 5);
    assert_eq!(fs::read_dir(tree.home_path(""))?.count(), 0);

    Ok(())
}
