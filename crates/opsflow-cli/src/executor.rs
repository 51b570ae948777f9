use std::path::Path;
use std::process::Command;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, instrument};

use opsflow_core::{ExecError, ExecutionAction};

use crate::OutputFormat;

/// One resolved mnemonic and the command line it runs.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub command: String,
    #[serde(flatten)]
    pub action: ExecutionAction,
}

/// Runs every step in order from `root`, stopping at the first failure.
#[instrument(skip_all, fields(steps = plan.len()))]
pub fn run(root: &Path, plan: &[Step]) -> Result<(), ExecError> {
    for step in plan {
        debug!(target: "opsflow", "run {}: {}", step.command, step.action.command_line());
        run_action(root, &step.action)?;
    }
    Ok(())
}

/// Spawns one action with inherited stdio and waits for it.
pub fn run_action(root: &Path, action: &ExecutionAction) -> Result<(), ExecError> {
    let status = Command::new(&action.program)
        .args(&action.args)
        .envs(&action.env)
        .current_dir(root)
        .status()
        .map_err(|source| ExecError::Spawn {
            program: action.program.clone(),
            source,
        })?;

    match ExecError::from_status(&action.command_line(), status) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Renders the plan without running it.
pub fn render(plan: &[Step], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(plan
            .iter()
            .map(|step| step.action.command_line())
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(plan)?),
    }
}
