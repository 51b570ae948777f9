//! Django management commands and dependency installation, run inside
//! the project's virtual environment.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use opsflow_core::config::EnvironmentConfig;
use opsflow_core::{CommandRef, ExecutionAction, Extension, OpsflowConfig, PrimaryCommand};
use tracing::debug;

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

pub fn default_capabilities() -> &'static [&'static str] {
    &[
        "migrate",
        "makemigrations",
        "collectstatic",
        "run-bot",
        "r-install",
    ]
}

#[derive(Debug)]
pub struct DjangoExtension {
    venv: PathBuf,
    env: EnvironmentConfig,
    inherited_path: Option<OsString>,
}

impl DjangoExtension {
    pub fn new(cfg: &OpsflowConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::with_env(cfg, &cwd, std::env::var_os("PATH"))
    }

    /// Like [`DjangoExtension::new`], with an explicit working directory and parent `PATH`.
    pub fn with_env(cfg: &OpsflowConfig, cwd: &Path, inherited_path: Option<OsString>) -> Self {
        Self {
            venv: venv_path(cwd, &cfg.project.root, &cfg.environment.venv),
            env: cfg.environment.clone(),
            inherited_path,
        }
    }

    fn bin_dir(&self) -> PathBuf {
        self.venv.join(BIN_DIR)
    }

    fn tool(&self, name: &str) -> String {
        self.bin_dir().join(name).to_string_lossy().into_owned()
    }

    fn manage(&self, args: &[&str]) -> ExecutionAction {
        let mut argv = vec![self.env.manage.clone()];
        argv.extend(args.iter().map(|s| (*s).to_string()));
        ExecutionAction::new(self.tool(&self.env.python), argv)
    }
}

impl Extension for DjangoExtension {
    fn name(&self) -> &str {
        "django"
    }

    fn capabilities(&self) -> HashSet<String> {
        default_capabilities()
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn build_action(&self, cmd: &CommandRef) -> Option<ExecutionAction> {
        let action = match cmd.primary {
            PrimaryCommand::Migrate => self.manage(&["migrate"]),
            PrimaryCommand::MakeMigrations => self.manage(&["makemigrations"]),
            PrimaryCommand::CollectStatic => self.manage(&["collectstatic", "--noinput"]),
            PrimaryCommand::RunBot => self.manage(&["runbot"]),
            PrimaryCommand::Install => ExecutionAction::new(
                self.tool(&self.env.pip),
                ["install", "-r", self.env.requirements.as_str()],
            ),
            _ => return None,
        };
        debug!("django: {} -> {}", cmd, action.command_line());
        Some(action)
    }

    /// What `source venv/bin/activate` would export.
    fn env_vars(&self) -> BTreeMap<String, String> {
        let bin = self.bin_dir();
        let mut dirs = vec![bin.clone()];
        if let Some(path) = &self.inherited_path {
            dirs.extend(std::env::split_paths(path));
        }
        let path = std::env::join_paths(dirs)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| bin.to_string_lossy().into_owned());

        BTreeMap::from([
            ("PATH".to_string(), path),
            (
                "VIRTUAL_ENV".to_string(),
                self.venv.to_string_lossy().into_owned(),
            ),
        ])
    }
}

/// Locates the venv so it resolves the same from the parent and from the
/// child, which runs with `root` as its working directory.
///
/// With the default root both agree, so the path stays relative. Any other
/// relative root is anchored at `cwd`.
fn venv_path(cwd: &Path, root: &Path, venv: &Path) -> PathBuf {
    if venv.is_absolute() || root == Path::new(".") {
        venv.to_path_buf()
    } else {
        cwd.join(root).join(venv)
    }
}
