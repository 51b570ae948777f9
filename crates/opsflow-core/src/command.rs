use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::constants::SERVICE_SELECTORS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryCommand {
    Init,
    Help,
    List,
    Migrate,
    MakeMigrations,
    CollectStatic,
    RunBot,
    Install,
    Restart,
    Logs,
    Status,
}

impl PrimaryCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Help => "help",
            Self::List => "list",
            Self::Migrate => "migrate",
            Self::MakeMigrations => "makemigrations",
            Self::CollectStatic => "collectstatic",
            Self::RunBot => "run-bot",
            Self::Install => "r-install",
            Self::Restart => "restart",
            Self::Logs => "logs",
            Self::Status => "status",
        }
    }

    /// Whether the command needs a service selector (`restart-django`).
    pub fn takes_selector(self) -> bool {
        matches!(self, Self::Restart | Self::Logs | Self::Status)
    }

    /// Commands handled by the CLI itself rather than an extension.
    pub fn is_builtin(self) -> bool {
        matches!(self, Self::Init | Self::Help | Self::List)
    }

    fn standalone(value: &str) -> Option<Self> {
        match value {
            "init" => Some(Self::Init),
            "help" => Some(Self::Help),
            "list" => Some(Self::List),
            "migrate" => Some(Self::Migrate),
            "makemigrations" => Some(Self::MakeMigrations),
            "collectstatic" => Some(Self::CollectStatic),
            "run-bot" | "runbot" => Some(Self::RunBot),
            "r-install" | "install" => Some(Self::Install),
            _ => None,
        }
    }

    fn with_selector(value: &str) -> Option<Self> {
        match value {
            "restart" => Some(Self::Restart),
            "logs" => Some(Self::Logs),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// A parsed mnemonic.
///
/// The canonical spelling joins primary and selector with a dash
/// (`restart-django`). `restart:django` is accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandRef {
    pub primary: PrimaryCommand,
    pub selector: Option<String>,
}

impl CommandRef {
    pub fn new(primary: PrimaryCommand) -> Self {
        Self {
            primary,
            selector: None,
        }
    }

    pub fn service(primary: PrimaryCommand, selector: &str) -> Self {
        Self {
            primary,
            selector: Some(selector.to_string()),
        }
    }

    pub fn canonical(&self) -> String {
        match &self.selector {
            Some(selector) => format!("{}-{}", self.primary.as_str(), selector),
            None => self.primary.as_str().to_string(),
        }
    }
}

impl Display for CommandRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (run 'ops list' to see available commands)")]
    Unknown(String),
    #[error("'{0}' needs a service: {0}-django or {0}-bot")]
    MissingSelector(&'static str),
    #[error("unknown service '{selector}' for '{primary}' (expected one of: django, bot)")]
    UnknownSelector {
        primary: &'static str,
        selector: String,
    },
}

impl FromStr for CommandRef {
    type Err = CommandParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if let Some(primary) = PrimaryCommand::standalone(value) {
            return Ok(Self::new(primary));
        }

        let (head, selector) = match value.split_once(|c: char| c == ':' || c == '-') {
            Some((head, tail)) => (head, Some(tail)),
            None => (value, None),
        };

        let primary = PrimaryCommand::with_selector(head)
            .ok_or_else(|| CommandParseError::Unknown(value.to_string()))?;

        match selector {
            None | Some("") => Err(CommandParseError::MissingSelector(primary.as_str())),
            Some(s) if SERVICE_SELECTORS.contains(&s) => Ok(Self::service(primary, s)),
            Some(s) => Err(CommandParseError::UnknownSelector {
                primary: primary.as_str(),
                selector: s.to_string(),
            }),
        }
    }
}
