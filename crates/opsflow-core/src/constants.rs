//! Constants used across the opsflow workspace.

/// The filename for opsflow's configuration.
pub const CONFIG_FILE: &str = "opsflow.toml";

/// The Django entry point, relative to the project root.
pub const MANAGE_PY: &str = "manage.py";

/// The dependency manifest consumed by `r-install`.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Virtual environment directory, relative to the project root.
pub const DEFAULT_VENV: &str = "venv";

/// Default systemd unit names.
pub const DEFAULT_DJANGO_UNIT: &str = "django";
pub const DEFAULT_BOT_UNIT: &str = "bot";

/// Command prefix for privileged mnemonics.
pub const DEFAULT_ESCALATION: &str = "sudo";

/// Sequence that restarts the web unit, then the bot unit.
pub const RESTART_ALL: &str = "restart-all";

/// Service selectors accepted by `restart`, `logs` and `status`.
pub const SERVICE_SELECTORS: &[&str] = &["django", "bot"];
