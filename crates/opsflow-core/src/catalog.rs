//! The mnemonics opsflow knows about, in the order they are listed.

use std::str::FromStr;

use crate::command::CommandRef;
use crate::constants::RESTART_ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
}

const fn entry(name: &'static str, description: &'static str) -> CatalogEntry {
    CatalogEntry { name, description }
}

pub const CATALOG: &[CatalogEntry] = &[
    entry(
        "migrate",
        "Apply pending database migrations via the application's management interface",
    ),
    entry("makemigrations", "Generate new migration files"),
    entry("collectstatic", "Gather static assets, non-interactively"),
    entry("restart-django", "Restart the web-serving system unit"),
    entry("restart-bot", "Restart the bot system unit"),
    entry(RESTART_ALL, "Restart both units, web service first"),
    entry("logs-django", "Follow the web service's journal output"),
    entry("logs-bot", "Follow the bot service's journal output"),
    entry(
        "r-install",
        "Install declared dependencies into the active environment",
    ),
    entry(
        "run-bot",
        "Run the bot in the foreground via its management command",
    ),
    entry("status-django", "Show the web service's unit status"),
    entry("status-bot", "Show the bot service's unit status"),
    entry("init", "Write a starter opsflow.toml"),
    entry("list", "List every command with its description"),
    entry("help", "Show usage, options and this command list"),
];

/// Looks up the description of a catalog mnemonic.
pub fn describe(name: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.description)
}

/// Whether `name` collides with a mnemonic that parses on its own.
pub fn is_reserved(name: &str) -> bool {
    CommandRef::from_str(name).is_ok()
}
