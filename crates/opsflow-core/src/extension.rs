use std::collections::{BTreeMap, HashSet};

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::command::CommandRef;

/// The action an extension wishes to execute for a given command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionAction {
    /// The executable program (e.g., "venv/bin/python", "sudo").
    pub program: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// Environment variables to set for the execution.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ExecutionAction {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    /// Prefixes the action with another program, e.g. `sudo`.
    pub fn wrapped(self, prefix: &[String]) -> Self {
        let Some((program, rest)) = prefix.split_first() else {
            return self;
        };

        let mut args = rest.to_vec();
        args.push(self.program);
        args.extend(self.args);

        Self {
            program: program.clone(),
            args,
            env: self.env,
        }
    }

    /// Renders the command line the way a shell user would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| shell_quote(part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(part: &str) -> String {
    let safe = !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if safe {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}

/// A contract for the backends that turn mnemonics into command lines.
pub trait Extension: std::fmt::Debug {
    /// Unique name of the extension.
    fn name(&self) -> &str;
    /// The set of command capabilities provided by this extension.
    fn capabilities(&self) -> HashSet<String>;
    /// Maps a command reference to an executable action.
    fn build_action(&self, cmd: &CommandRef) -> Option<ExecutionAction>;

    /// Environment variables applied to every action of this extension.
    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// A registry containing all registered extensions.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<String, Box<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Registers a new extension into the registry.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        debug!("registering extension: {}", extension.name());
        self.extensions
            .insert(extension.name().to_string(), extension);
    }

    fn supports(ext: &dyn Extension, cmd: &CommandRef) -> bool {
        let caps = ext.capabilities();
        caps.contains(cmd.primary.as_str()) || caps.contains(&cmd.canonical())
    }

    /// Verifies that a registered extension can handle the given command.
    ///
    /// # Errors
    /// Returns an error if no registered extension exposes the required capability.
    #[instrument(skip(self))]
    pub fn ensure_can_run(&self, cmd: &CommandRef) -> Result<()> {
        debug!("checking capability support for: {}", cmd.canonical());
        if self
            .extensions
            .values()
            .any(|ext| Self::supports(ext.as_ref(), cmd))
        {
            return Ok(());
        }

        bail!("no extension exposes capability '{}'", cmd.canonical())
    }

    /// Builds the execution arguments for a command against a specific extension.
    pub fn build_action(&self, name: &str, cmd: &CommandRef) -> Option<ExecutionAction> {
        let ext = self.extensions.get(name)?;
        let mut action = ext.build_action(cmd)?;
        // Action-specific variables win over the extension-wide ones.
        let mut merged_env = ext.env_vars();
        merged_env.extend(action.env);
        action.env = merged_env;
        Some(action)
    }

    /// Finds the first extension that supports `cmd` and builds its action.
    #[instrument(skip(self))]
    pub fn resolve(&self, cmd: &CommandRef) -> Result<ExecutionAction> {
        let name = self
            .extensions
            .values()
            .find(|ext| Self::supports(ext.as_ref(), cmd))
            .map(|ext| ext.name().to_string())
            .ok_or_else(|| anyhow!("no extension exposes capability '{}'", cmd.canonical()))?;

        self.build_action(&name, cmd)
            .ok_or_else(|| anyhow!("extension '{}' declined '{}'", name, cmd.canonical()))
    }
}
