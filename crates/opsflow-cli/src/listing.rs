use anyhow::Result;
use serde::Serialize;

use opsflow_core::catalog::{self, CATALOG};
use opsflow_core::OpsflowConfig;

use crate::styles as s;
use crate::OutputFormat;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub description: String,
}

/// Every runnable mnemonic: the catalog first, then configured sequences by name.
pub fn entries(cfg: &OpsflowConfig) -> Vec<Entry> {
    let mut out = CATALOG
        .iter()
        .map(|e| Entry {
            name: e.name.to_string(),
            description: e.description.to_string(),
        })
        .collect::<Vec<_>>();

    let mut extra = cfg
        .sequences
        .iter()
        .filter(|(name, _)| catalog::describe(name).is_none())
        .map(|(name, steps)| Entry {
            name: name.clone(),
            description: format!("Run in order: {}", steps.join(", ")),
        })
        .collect::<Vec<_>>();
    extra.sort_by(|a, b| a.name.cmp(&b.name));

    out.extend(extra);
    out
}

pub fn render(cfg: &OpsflowConfig, format: OutputFormat, colored: bool) -> Result<String> {
    let entries = entries(cfg);
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }
    Ok(render_text(&entries, colored))
}

fn render_text(entries: &[Entry], colored: bool) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0) + 2;
    let mut out = format!("{}\n", s::paint(s::HEADING, "Commands:", colored));
    for entry in entries {
        out.push_str(&format!(
            "  {}{}\n",
            s::paint(s::MNEMONIC, &format!("{:<width$}", entry.name), colored),
            s::paint(s::NOTE, &entry.description, colored),
        ));
    }
    out
}

const EXAMPLES: &[(&str, &str)] = &[
    ("ops migrate", "Apply pending migrations"),
    ("ops restart all", "Restart django, then the bot"),
    ("ops logs-bot", "Follow the bot's journal"),
    ("ops --dry-run restart-all", "Print the commands without running them"),
];

/// Text shown after clap's option list: the built-in commands, then examples.
///
/// Sequences from `opsflow.toml` are not known yet when help is rendered;
/// `ops list` shows them.
pub fn help_footer(colored: bool) -> String {
    let mut out = render_text(&entries(&OpsflowConfig::default()), colored);
    out.push_str(&format!("\n{}\n", s::paint(s::HEADING, "Examples:", colored)));
    let width = EXAMPLES.iter().map(|(cmd, _)| cmd.len()).max().unwrap_or(0) + 2;
    for (cmd, note) in EXAMPLES {
        out.push_str(&format!(
            "  {}{}\n",
            s::paint(s::LITERAL, &format!("{cmd:<width$}"), colored),
            s::paint(s::NOTE, &format!("# {note}"), colored),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_mnemonic_of_the_command_surface() {
        let out = render(&OpsflowConfig::default(), OutputFormat::Text, false).unwrap();
        let expected = [
            ("migrate", "Apply pending database migrations via the application's management interface"),
            ("makemigrations", "Generate new migration files"),
            ("collectstatic", "Gather static assets, non-interactively"),
            ("restart-django", "Restart the web-serving system unit"),
            ("restart-bot", "Restart the bot system unit"),
            ("restart-all", "Restart both units, web service first"),
            ("logs-django", "Follow the web service's journal output"),
            ("logs-bot", "Follow the bot service's journal output"),
            ("r-install", "Install declared dependencies into the active environment"),
        ];
        for (name, description) in expected {
            let line = out
                .lines()
                .find(|l| l.split_whitespace().next() == Some(name))
                .unwrap_or_else(|| panic!("{name} missing from listing"));
            assert!(line.ends_with(description), "bad line: {line}");
        }
    }

    #[test]
    fn listing_keeps_table_order() {
        let names = entries(&OpsflowConfig::default())
            .into_iter()
            .map(|e| e.name)
            .take(3)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["migrate", "makemigrations", "collectstatic"]);
    }

    #[test]
    fn configured_sequences_are_appended() {
        let cfg = OpsflowConfig::from_toml(
            "[sequences]\ndeploy = [\"migrate\", \"restart-all\"]\n",
        )
        .unwrap();
        let all = entries(&cfg);
        let last = all.last().unwrap();
        assert_eq!(last.name, "deploy");
        assert_eq!(last.description, "Run in order: migrate, restart-all");
        assert_eq!(all.iter().filter(|e| e.name == "restart-all").count(), 1);
    }

    #[test]
    fn help_footer_lists_commands_and_examples() {
        let out = help_footer(false);
        for entry in CATALOG {
            assert!(out.contains(entry.name), "{} missing from help", entry.name);
        }
        assert!(out.contains("Examples:"));
        assert!(out.contains("ops restart all"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn colored_listing_keeps_names_intact() {
        let out = render(&OpsflowConfig::default(), OutputFormat::Text, true).unwrap();
        assert!(out.contains('\x1b'));
        assert!(out.contains("restart-all"));
    }

    #[test]
    fn json_listing_parses() {
        let out = render(&OpsflowConfig::default(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "migrate");
    }
}
