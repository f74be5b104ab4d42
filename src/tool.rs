// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External tool installation.
//!
//! Bootstrapping an environment usually means making sure a couple of
//! package managers exist before anything else can happen. Dotlink treats
//! each of them as an opaque [`ToolInstaller`] that can tell whether its tool
//! is present, and install it if not. Link reconciliation never depends on
//! any of this.
//!
//! Failed installations are reported and never retried.

use crate::{config::ToolDefinition, link::report::error_chain};

use indicatif::{ProgressBar, ProgressStyle};
use std::{
    ffi::OsStr,
    process::{Command, Stdio},
    time::Duration,
};
use tracing::{debug, error, info, instrument};

/// Capability to check for and install an external tool.
pub trait ToolInstaller {
    /// Name of tool, used in reports.
    fn name(&self) -> &str;

    /// Check if tool is already present.
    fn is_present(&self) -> bool;

    /// Install tool.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError`] if installation fails.
    fn install(&self) -> Result<()>;

    /// Run follow-up work once tool is known to be present.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError`] if follow-up work fails.
    fn follow_up(&self) -> Result<()> {
        Ok(())
    }
}

/// What happened to a tool during [`run_tools`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    AlreadyPresent,
    Installed,
}

/// Ensure every tool is present, in order.
///
/// A tool whose installation fails has its follow-up work skipped, but the
/// remaining tools are still processed.
pub fn run_tools<'a, I>(
    installers: impl IntoIterator<Item = &'a I>,
) -> Vec<(String, Result<ToolOutcome>)>
where
    I: ToolInstaller + ?Sized + 'a,
{
    let mut results = Vec::new();
    for installer in installers {
        let result = ensure_tool(installer);
        if let Err(err) = &result {
            error!("{}: {}", installer.name(), error_chain(err));
        }
        results.push((installer.name().to_string(), result));
    }

    results
}

#[instrument(skip(installer), fields(tool = installer.name()), level = "debug")]
fn ensure_tool<I>(installer: &I) -> Result<ToolOutcome>
where
    I: ToolInstaller + ?Sized,
{
    let outcome = if installer.is_present() {
        info!("{} is already installed", installer.name());
        ToolOutcome::AlreadyPresent
    } else {
        info!("installing {}", installer.name());
        installer.install()?;
        ToolOutcome::Installed
    };

    installer.follow_up()?;

    Ok(outcome)
}

/// Tool installer that shells out through `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInstaller {
    name: String,
    check: String,
    install: String,
    after: Vec<String>,
}

impl ShellInstaller {
    /// Construct new shell installer.
    pub fn new(
        name: impl Into<String>,
        check: impl Into<String>,
        install: impl Into<String>,
        after: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            check: check.into(),
            install: install.into(),
            after: after.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&ToolDefinition> for ShellInstaller {
    fn from(definition: &ToolDefinition) -> Self {
        Self::new(
            &definition.name,
            &definition.check,
            &definition.install,
            &definition.after,
        )
    }
}

impl ToolInstaller for ShellInstaller {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_present(&self) -> bool {
        let lookup = format!("command -v '{}'", self.check.replace('\'', r"'\''"));
        Command::new("sh")
            .args(["-c", lookup.as_str()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn install(&self) -> Result<()> {
        syscall_interactive("sh", ["-c", self.install.as_str()])?;

        // INVARIANT: Installer exiting cleanly is not proof of installation.
        if !self.is_present() {
            return Err(InstallError::StillMissing {
                name: self.name.clone(),
                check: self.check.clone(),
            });
        }

        Ok(())
    }

    fn follow_up(&self) -> Result<()> {
        for command in &self.after {
            let bar = ProgressBar::new_spinner();
            bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            bar.set_message(command.clone());
            bar.enable_steady_tick(Duration::from_millis(100));

            let result = syscall_non_interactive("sh", ["-c", command.as_str()]);
            bar.finish_and_clear();

            let output = result?;
            info!("ran {command:?}");
            if !output.is_empty() {
                debug!("{output}");
            }
        }

        Ok(())
    }
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let status = Command::new(cmd.as_ref()).args(args).spawn()?.wait()?;
    if !status.success() {
        return Err(InstallError::Failed {
            command: cmd.as_ref().to_string_lossy().into_owned(),
            message: status.to_string(),
        });
    }

    Ok(())
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect::<Vec<_>>();
    let output = Command::new(cmd.as_ref()).args(&args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        let command = args
            .last()
            .unwrap_or(&cmd.as_ref().to_os_string())
            .to_string_lossy()
            .into_owned();
        return Err(InstallError::Failed { command, message });
    }

    Ok(message)
}

/// Tool installation error types.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Command could not be spawned at all.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),

    /// Command exited unsuccessfully.
    #[error("command {command:?} failed: {message}")]
    Failed { command: String, message: String },

    /// Installer finished, yet tool still cannot be found.
    #[error("{name} is still missing after install, {check:?} not found on PATH")]
    StillMissing { name: String, check: String },

    /// Style template cannot be set for progress spinner.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = InstallError> = std::result::Result<T, E>;
