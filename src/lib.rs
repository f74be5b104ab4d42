// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Personal environment bootstrapper.
//!
//! Dotlink links configuration files from a managed source tree into a
//! user's home and config directories, and makes sure a small set of
//! external tools are installed. Everything it does is declared in one
//! manifest file, and every run is safe to repeat.
//!
//! - [`config`]: manifest layout.
//! - [`link`]: link planning and reconciliation.
//! - [`tool`]: external tool installation.
//! - [`clean`]: broken symlink cleanup.

pub mod clean;
pub mod config;
pub mod link;
pub mod path;
pub mod tool;
