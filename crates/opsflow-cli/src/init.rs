use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use tracing::{info, instrument, warn};

use opsflow_core::constants::MANAGE_PY;
use opsflow_core::OpsflowConfig;

use crate::Cli;

/// Runs the `init` command to write a starter `opsflow.toml`.
#[instrument(skip(cli))]
pub fn run(cli: &Cli) -> Result<()> {
    if !Path::new(MANAGE_PY).exists() {
        warn!("no {} in the current directory; adjust [project] root", MANAGE_PY);
    }

    let name = std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "my-django-project".to_string());
    let content = render_config(&name);

    // Never write something the loader would reject.
    OpsflowConfig::from_toml(&content).context("rendered config is invalid")?;

    if cli.stdout {
        print!("{content}");
        return Ok(());
    }

    write_if_absent(&cli.config, &content, cli.force)
        .with_context(|| format!("failed to write '{}'", cli.config))?;

    info!("init complete: project={}, config={}", name, cli.config);
    println!("next: run 'ops list'");

    Ok(())
}

fn render_config(project_name: &str) -> String {
    let name = project_name.replace(&['"', '\\'][..], "");
    format!(
        r#"[project]
name = "{name}"
root = "."

[environment]
venv = "venv"
manage = "manage.py"
requirements = "requirements.txt"

[services]
django = "django"
bot = "bot"

[privilege]
# Prefix for restart-* and logs-*. Use [] when running as root.
escalate = ["sudo"]

[sequences]
restart-all = ["restart-django", "restart-bot"]
# deploy = ["r-install", "migrate", "collectstatic", "restart-all"]
"#
    )
}

fn write_if_absent(path: &str, content: &str, force: bool) -> Result<()> {
    let output = Path::new(path);

    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            path
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
        }
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}
