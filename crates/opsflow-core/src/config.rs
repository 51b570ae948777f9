use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::catalog;
use crate::constants::*;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpsflowConfig {
    pub project: ProjectConfig,
    pub environment: EnvironmentConfig,
    pub services: ServicesConfig,
    pub privilege: PrivilegeConfig,
    pub sequences: HashMap<String, Vec<String>>,
}

impl Default for OpsflowConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            environment: EnvironmentConfig::default(),
            services: ServicesConfig::default(),
            privilege: PrivilegeConfig::default(),
            sequences: builtin_sequences(),
        }
    }
}

impl OpsflowConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml(&text).with_context(|| format!("invalid config: {path}"))
    }

    /// Loads `path`, or falls back to the built-in defaults when it does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            debug!("config '{}' not found, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let mut cfg = toml::from_str::<Self>(text).context("failed to parse TOML config")?;
        for (name, steps) in builtin_sequences() {
            cfg.sequences.entry(name).or_insert(steps);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        for (key, unit) in [("django", &self.services.django), ("bot", &self.services.bot)] {
            if unit.trim().is_empty() {
                bail!("services.{key} must name a systemd unit");
            }
        }

        for (name, steps) in &self.sequences {
            if catalog::is_reserved(name) {
                bail!("sequence '{name}' shadows a built-in command");
            }
            if steps.is_empty() {
                bail!("sequence '{name}' is empty");
            }
        }

        Ok(())
    }

    /// Resolves the systemd unit for a service selector.
    pub fn unit_for(&self, selector: &str) -> Option<&str> {
        self.services.unit_for(selector)
    }
}

fn builtin_sequences() -> HashMap<String, Vec<String>> {
    HashMap::from([(
        RESTART_ALL.to_string(),
        vec!["restart-django".to_string(), "restart-bot".to_string()],
    )])
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    /// Working directory for every external command.
    pub root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "opsflow".to_string(),
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub venv: PathBuf,
    pub python: String,
    pub pip: String,
    pub manage: String,
    pub requirements: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            venv: PathBuf::from(DEFAULT_VENV),
            python: "python".to_string(),
            pip: "pip".to_string(),
            manage: MANAGE_PY.to_string(),
            requirements: REQUIREMENTS_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicesConfig {
    pub django: String,
    pub bot: String,
}

impl ServicesConfig {
    pub fn unit_for(&self, selector: &str) -> Option<&str> {
        match selector {
            "django" => Some(&self.django),
            "bot" => Some(&self.bot),
            _ => None,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            django: DEFAULT_DJANGO_UNIT.to_string(),
            bot: DEFAULT_BOT_UNIT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrivilegeConfig {
    /// Prefix for privileged commands. Empty runs them directly.
    pub escalate: Vec<String>,
}

impl Default for PrivilegeConfig {
    fn default() -> Self {
        Self {
            escalate: vec![DEFAULT_ESCALATION.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_makefile_layout() {
        let cfg = OpsflowConfig::default();
        assert_eq!(cfg.environment.venv, PathBuf::from("venv"));
        assert_eq!(cfg.environment.manage, "manage.py");
        assert_eq!(cfg.environment.requirements, "requirements.txt");
        assert_eq!(cfg.unit_for("django"), Some("django"));
        assert_eq!(cfg.unit_for("bot"), Some("bot"));
        assert_eq!(cfg.unit_for("worker"), None);
        assert_eq!(cfg.privilege.escalate, vec!["sudo"]);
        assert_eq!(
            cfg.sequences.get("restart-all"),
            Some(&vec!["restart-django".to_string(), "restart-bot".to_string()])
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = OpsflowConfig::from_toml(
            r#"
            [services]
            django = "gunicorn-shop"

            [sequences]
            deploy = ["r-install", "migrate", "restart-all"]
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.services.django, "gunicorn-shop");
        assert_eq!(cfg.services.bot, "bot");
        assert!(cfg.sequences.contains_key("deploy"));
        assert!(cfg.sequences.contains_key("restart-all"));
    }

    #[test]
    fn restart_all_can_be_overridden() {
        let cfg = OpsflowConfig::from_toml(
            r#"
            [sequences]
            restart-all = ["restart-bot", "restart-django"]
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.sequences["restart-all"], vec!["restart-bot", "restart-django"]);
    }

    #[test]
    fn empty_escalation_is_allowed() {
        let cfg = OpsflowConfig::from_toml("[privilege]\nescalate = []\n").expect("should parse");
        assert!(cfg.privilege.escalate.is_empty());
    }

    #[test]
    fn rejects_sequence_shadowing_a_command() {
        let err = OpsflowConfig::from_toml("[sequences]\nmigrate = [\"collectstatic\"]\n")
            .expect_err("must fail");
        assert!(err.to_string().contains("shadows"));
    }

    #[test]
    fn rejects_blank_unit() {
        let err = OpsflowConfig::from_toml("[services]\nbot = \" \"\n").expect_err("must fail");
        assert!(err.to_string().contains("services.bot"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(OpsflowConfig::from_toml("[services]\nworker = \"celery\"\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsflow.toml");
        let cfg = OpsflowConfig::load_or_default(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.project.name, "opsflow");
    }

    #[test]
    fn load_from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsflow.toml");
        std::fs::write(&path, "[project]\nname = \"shop\"\n").unwrap();
        let cfg = OpsflowConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.project.name, "shop");
        assert_eq!(cfg.project.root, PathBuf::from("."));
    }
}
