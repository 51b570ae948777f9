use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use opsflow_core::{CommandRef, OpsflowConfig};

/// Expands a named sequence into the commands it runs, in order.
///
/// Steps may name other sequences. A sequence that reaches itself is rejected.
pub fn resolve_sequence(cfg: &OpsflowConfig, name: &str) -> Result<Vec<CommandRef>> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    expand(cfg, name, &mut stack, &mut out)?;
    debug!(
        "sequence '{}' resolved to [{}]",
        name,
        out.iter().map(CommandRef::canonical).collect::<Vec<_>>().join(", ")
    );
    Ok(out)
}

fn expand<'a>(
    cfg: &'a OpsflowConfig,
    name: &'a str,
    stack: &mut Vec<&'a str>,
    out: &mut Vec<CommandRef>,
) -> Result<()> {
    if stack.contains(&name) {
        stack.push(name);
        bail!("sequence cycle: {}", stack.join(" -> "));
    }

    let steps = cfg
        .sequences
        .get(name)
        .ok_or_else(|| anyhow!("unknown sequence '{name}'"))?;

    stack.push(name);
    for step in steps {
        if cfg.sequences.contains_key(step.as_str()) {
            expand(cfg, step, stack, out)?;
            continue;
        }
        let cmd = CommandRef::from_str(step)
            .map_err(|e| anyhow!("invalid step '{}' in sequence '{}': {}", step, name, e))?;
        if cmd.primary.is_builtin() {
            bail!("step '{}' in sequence '{}' cannot be sequenced", step, name);
        }
        out.push(cmd);
    }
    stack.pop();

    Ok(())
}

/// Whether `name` refers to a configured sequence.
pub fn is_sequence(cfg: &OpsflowConfig, name: &str) -> bool {
    cfg.sequences.contains_key(name)
}
