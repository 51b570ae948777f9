//! Service control and journal access for the web and bot units.

use std::collections::HashSet;

use opsflow_core::config::ServicesConfig;
use opsflow_core::{CommandRef, ExecutionAction, Extension, OpsflowConfig, PrimaryCommand};
use tracing::debug;

pub fn default_capabilities() -> &'static [&'static str] {
    &["restart", "logs", "status"]
}

#[derive(Debug)]
pub struct SystemdExtension {
    services: ServicesConfig,
    escalate: Vec<String>,
}

impl SystemdExtension {
    pub fn new(cfg: &OpsflowConfig) -> Self {
        Self {
            services: cfg.services.clone(),
            escalate: cfg.privilege.escalate.clone(),
        }
    }
}

impl Extension for SystemdExtension {
    fn name(&self) -> &str {
        "systemd"
    }

    fn capabilities(&self) -> HashSet<String> {
        default_capabilities()
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn build_action(&self, cmd: &CommandRef) -> Option<ExecutionAction> {
        let unit = self.services.unit_for(cmd.selector.as_deref()?)?;

        let action = match cmd.primary {
            PrimaryCommand::Restart => {
                ExecutionAction::new("systemctl", ["restart", unit]).wrapped(&self.escalate)
            }
            PrimaryCommand::Logs => {
                ExecutionAction::new("journalctl", ["-u", unit, "-f"]).wrapped(&self.escalate)
            }
            // Reading unit state needs no privileges.
            PrimaryCommand::Status => {
                ExecutionAction::new("systemctl", ["status", unit, "--no-pager"])
            }
            _ => return None,
        };
        debug!("systemd: {} -> {}", cmd, action.command_line());
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(ext: &SystemdExtension, mnemonic: &str) -> Option<String> {
        let cmd = CommandRef::from_str(mnemonic).unwrap();
        ext.build_action(&cmd).map(|a| a.command_line())
    }

    #[test]
    fn restarts_are_escalated() {
        let ext = SystemdExtension::new(&OpsflowConfig::default());
        assert_eq!(
            line(&ext, "restart-django").as_deref(),
            Some("sudo systemctl restart django")
        );
        assert_eq!(
            line(&ext, "restart-bot").as_deref(),
            Some("sudo systemctl restart bot")
        );
    }

    #[test]
    fn logs_follow_the_journal() {
        let ext = SystemdExtension::new(&OpsflowConfig::default());
        assert_eq!(
            line(&ext, "logs-django").as_deref(),
            Some("sudo journalctl -u django -f")
        );
        assert_eq!(
            line(&ext, "logs-bot").as_deref(),
            Some("sudo journalctl -u bot -f")
        );
    }

    #[test]
    fn status_is_not_escalated() {
        let ext = SystemdExtension::new(&OpsflowConfig::default());
        assert_eq!(
            line(&ext, "status-bot").as_deref(),
            Some("systemctl status bot --no-pager")
        );
    }

    #[test]
    fn configured_units_and_escalation_are_used() {
        let cfg = OpsflowConfig::from_toml(
            r#"
            [services]
            django = "shop-gunicorn.service"
            bot = "shop-bot.service"

            [privilege]
            escalate = []
            "#,
        )
        .unwrap();
        let ext = SystemdExtension::new(&cfg);
        assert_eq!(
            line(&ext, "restart-django").as_deref(),
            Some("systemctl restart shop-gunicorn.service")
        );
        assert_eq!(
            line(&ext, "logs-bot").as_deref(),
            Some("journalctl -u shop-bot.service -f")
        );
    }

    #[test]
    fn management_commands_are_not_handled() {
        let ext = SystemdExtension::new(&OpsflowConfig::default());
        assert_eq!(line(&ext, "migrate"), None);
    }
}
