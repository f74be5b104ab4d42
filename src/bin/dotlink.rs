// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotlink::{
    clean::{find_broken_symlinks, remove_broken_symlinks},
    config::Manifest,
    link::{Planner, Reconciler, Roots, RunMode},
    path::{config_dir, default_manifest_path, home_dir},
    tool::{run_tools, ShellInstaller, ToolInstaller},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use inquire::Confirm;
use std::{
    fs::read_to_string,
    path::{absolute, Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "dotlink [options] <dotlink-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to manifest file [default: ./dotlink.toml].
    #[arg(short, long, global = true, value_name = "path")]
    pub manifest: Option<PathBuf>,

    /// Show debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let manifest = self.manifest.unwrap_or_else(default_manifest_path);
        match self.command {
            Command::Link(opts) => run_link(&manifest, opts),
            Command::Tools(opts) => run_tools_command(&manifest, opts),
            Command::Up(opts) => run_up(&manifest, opts),
            Command::Plan => run_plan(&manifest),
            Command::Clean(opts) => run_clean(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Link every group in manifest into place.
    #[command(override_usage = "dotlink link [options]")]
    Link(CheckOptions),

    /// Install missing tools declared in manifest.
    #[command(override_usage = "dotlink tools [options]")]
    Tools(CheckOptions),

    /// Link every group, then install missing tools.
    #[command(override_usage = "dotlink up [options]")]
    Up(CheckOptions),

    /// Show every planned source and target pair.
    #[command(override_usage = "dotlink plan [options]")]
    Plan,

    /// Find and interactively remove broken symlinks.
    #[command(override_usage = "dotlink clean [options]")]
    Clean(CleanOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CheckOptions {
    /// Report what would happen without changing anything.
    #[arg(short, long)]
    pub check: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CleanOptions {
    /// Directory to search for broken symlinks [default: ~/.config].
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = cli.run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn load_manifest(path: &Path) -> Result<(Manifest, Roots)> {
    let path = absolute(path)?;
    let data = read_to_string(&path)
        .with_context(|| format!("failed to read manifest at {:?}", path.display()))?;
    let manifest: Manifest = data.parse()?;
    let manifest_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let roots = manifest.settings.roots(manifest_dir, home_dir()?);

    Ok((manifest, roots))
}

fn run_mode(opts: &CheckOptions) -> RunMode {
    if opts.check {
        RunMode::CheckOnly
    } else {
        RunMode::Apply
    }
}

fn link_all(manifest: &Manifest, roots: Roots, mode: RunMode) -> usize {
    let planner = Planner::new(roots);
    let specs = planner.declare(&manifest.groups);
    let pairs = planner.plan(&specs);

    let transcript = Reconciler::new(mode).run(pairs);
    let summary = transcript.summary();
    info!("{summary}");

    summary.failed
}

fn install_all(manifest: &Manifest, mode: RunMode) -> usize {
    let installers = manifest
        .tools
        .iter()
        .map(ShellInstaller::from)
        .collect::<Vec<_>>();

    if mode == RunMode::CheckOnly {
        for installer in &installers {
            if installer.is_present() {
                info!("{} is already installed", installer.name());
            } else {
                warn!("{} would be installed", installer.name());
            }
        }
        return 0;
    }

    run_tools(&installers)
        .iter()
        .filter(|(_, result)| result.is_err())
        .count()
}

fn run_link(manifest_path: &Path, opts: CheckOptions) -> Result<()> {
    let (manifest, roots) = load_manifest(manifest_path)?;
    let failed = link_all(&manifest, roots, run_mode(&opts));
    if failed > 0 {
        bail!("{failed} link(s) failed");
    }

    Ok(())
}

fn run_tools_command(manifest_path: &Path, opts: CheckOptions) -> Result<()> {
    let (manifest, _) = load_manifest(manifest_path)?;
    let failed = install_all(&manifest, run_mode(&opts));
    if failed > 0 {
        bail!("{failed} tool(s) failed to install");
    }

    Ok(())
}

fn run_up(manifest_path: &Path, opts: CheckOptions) -> Result<()> {
    let (manifest, roots) = load_manifest(manifest_path)?;
    let mode = run_mode(&opts);
    let failed_links = link_all(&manifest, roots, mode);
    let failed_tools = install_all(&manifest, mode);
    if failed_links + failed_tools > 0 {
        bail!("{failed_links} link(s) and {failed_tools} tool(s) failed");
    }

    Ok(())
}

fn run_plan(manifest_path: &Path) -> Result<()> {
    let (manifest, roots) = load_manifest(manifest_path)?;
    let planner = Planner::new(roots);
    let specs = planner.declare(&manifest.groups);
    for pair in planner.plan(&specs) {
        println!("{pair}");
    }

    Ok(())
}

fn run_clean(opts: CleanOptions) -> Result<()> {
    let root = match opts.root {
        Some(root) => root,
        None => config_dir()?,
    };

    let links = find_broken_symlinks(&root)?;
    if links.is_empty() {
        info!("no broken symlinks found in {}", root.display());
        return Ok(());
    }

    info!("found {} broken symlink(s):", links.len());
    for link in &links {
        info!("  {} -> {}", link.path.display(), link.points_to.display());
    }

    let confirmed = Confirm::new("Remove these symlinks?")
        .with_default(false)
        .prompt()?;
    if !confirmed {
        info!("aborted");
        return Ok(());
    }

    let removed = remove_broken_symlinks(&links)?;
    info!("removed {removed} broken symlink(s)");

    Ok(())
}
