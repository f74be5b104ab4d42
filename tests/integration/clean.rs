// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

#![cfg(unix)]

use crate::TreeFixture;

use anyhow::Result;
use dotlink::{
    clean::{find_broken_symlinks, remove_broken_symlinks},
    link::RunMode,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

#[sealed_test]
fn renamed_source_leaves_link_for_cleanup() -> Result<()> {
    let tree = TreeFixture::new()?;
    tree.source_file("config/kitty/kitty.conf", "font_size 12")?;
    tree.source_file("config/kitty/theme.conf", "background #000")?;
    let manifest = indoc! {r#"
        [[group]]
        name = "kitty"
        source = "config/kitty"
        targets = [".config/kitty"]
        mode = "expand"
        ensure_target_dir = true
    "#};

    tree.run(manifest, RunMode::Apply)?;
    fs::rename(
        tree.source_path("config/kitty/theme.conf"),
        tree.source_path("config/kitty/current-theme.conf"),
    )?;

    let config = tree.home_path(".config");
    let broken = find_broken_symlinks(&config)?;
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].path, tree.home_path(".config/kitty/theme.conf"));
    assert_eq!(broken[0].points_to, tree.source_path("config/kitty/theme.conf"));

    assert_eq!(remove_broken_symlinks(&broken)?, 1);
    assert!(find_broken_symlinks(&config)?.is_empty());

    // Re-running links the renamed entry and keeps the rest.
    let transcript = tree.run(manifest, RunMode::Apply)?;
    let summary = transcript.summary();
    assert_eq!((summary.created, summary.correct), (1, 1));

    Ok(())
}
