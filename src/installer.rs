use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use crate::{utils::system::exit_code, Params};

/// Runs pip as a module of the selected interpreter.
pub const PIP_MODULE: [&str; 2] = ["-m", "pip"];

pub const INSTALL_ARGS: [&str; 5] = [
    "install",
    "--no-cache",
    "--upgrade",
    "--upgrade-strategy",
    "only-if-needed",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InstallCommand {
    pub fn pip_install(python: &str, target: &str) -> Self {
        let args = PIP_MODULE
            .iter()
            .chain(INSTALL_ARGS.iter())
            .copied()
            .chain(std::iter::once(target))
            .map(String::from)
            .collect();
        Self {
            program: python.to_string(),
            args,
        }
    }

    /// Arguments seen by pip itself, starting at the `install` subcommand.
    pub fn install_args(&self) -> &[String] {
        self.args.get(PIP_MODULE.len()..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Completed,
    Failed { code: i32 },
}

impl InstallOutcome {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            return InstallOutcome::Completed;
        }
        InstallOutcome::Failed { code }
    }

    pub fn code(&self) -> i32 {
        match self {
            InstallOutcome::Completed => 0,
            InstallOutcome::Failed { code } => *code,
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and returns its exit code.
    async fn run(&self, cmd: &InstallCommand) -> anyhow::Result<i32>;
}

/// Spawns the command as a child process sharing this process's stdio.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &InstallCommand) -> anyhow::Result<i32> {
        tracing::trace!(program = %cmd.program, args = ?cmd.args, "Running command");
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Spawn {}", cmd.program))?;
        let code = exit_code(status);
        tracing::debug!(code, status = %status, "Command finished");
        Ok(code)
    }
}

pub async fn install(
    runner: &dyn CommandRunner,
    params: &Params<'_>,
) -> anyhow::Result<InstallOutcome> {
    let target = params.source.resolve(params.spec);
    tracing::info!(spec = %params.spec, install_target = target, "Resolved install target");

    let cmd = InstallCommand::pip_install(params.python, &target);
    tracing::info!(program = %cmd.program, args = ?cmd.args, "Install command");
    if params.dry_run {
        tracing::info!("Dry run, command not executed");
        return Ok(InstallOutcome::Completed);
    }

    let outcome = InstallOutcome::from_code(runner.run(&cmd).await?);
    match outcome {
        InstallOutcome::Completed => tracing::info!(install_target = target, "Installed"),
        InstallOutcome::Failed { code } => {
            tracing::error!(install_target = target, code, "Install failed")
        }
    }
    Ok(outcome)
}
