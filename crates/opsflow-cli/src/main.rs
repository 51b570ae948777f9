use std::io::IsTerminal;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};

use opsflow_core::constants::CONFIG_FILE;
use opsflow_core::{
    CommandParseError, CommandRef, ExecError, ExtensionRegistry, OpsflowConfig, PrimaryCommand,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod executor;
mod init;
mod listing;
mod styles;

use executor::Step;
use styles as s;

/// The command-line interface for opsflow.
#[derive(Debug, Parser)]
#[command(name = "ops")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Operational shortcuts for a Django site and its Telegram bot")]
#[command(
    long_about = "opsflow maps short mnemonics to the commands you would otherwise type by hand:
Django management commands inside the project's virtualenv, systemd restarts,
journal tails and dependency installs. Exit codes are passed through unchanged."
)]
pub(crate) struct Cli {
    /// Command mnemonic, for example: `migrate`, `restart-django`, `logs-bot`
    command: Option<String>,
    /// Optional service (supports `ops restart django` style). Anything else is ignored;
    /// put ignored arguments that start with `-` after `--`.
    args: Vec<String>,
    /// Path to opsflow config file. Defaults apply when it does not exist.
    #[arg(long, default_value = CONFIG_FILE)]
    config: String,
    /// Print the command lines instead of running them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Output format for `list` and `--dry-run`.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Print the config generated by `init` to stdout instead of writing it.
    #[arg(long, default_value_t = false)]
    stdout: bool,
    /// Overwrite the config file on `init` if it already exists.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// What a command line asks for once mnemonics are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Builtin(PrimaryCommand),
    Sequence(String),
    Single(CommandRef),
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let matches = cli_command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    debug!("parsed cli arguments: {:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(exit_status(&err)),
    }
}

/// `RUST_LOG` when set, `info` otherwise.
fn env_filter(directives: Option<String>) -> EnvFilter {
    match directives {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new("info"),
    }
}

/// The clap command with the command listing appended to its help.
fn cli_command() -> clap::Command {
    let colored = std::io::stdout().is_terminal();
    Cli::command().after_help(listing::help_footer(colored))
}

fn print_help() -> Result<()> {
    cli_command().print_help()?;
    Ok(())
}

/// A failed external command already printed its own diagnostics, so only
/// its exit status is forwarded.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ExecError>() {
        Some(exec @ ExecError::Spawn { .. }) => {
            eprintln!("error: {exec}");
            exec.exit_code()
        }
        Some(exec) => {
            debug!("{exec}");
            exec.exit_code()
        }
        None => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let command_name = match &cli.command {
        Some(cmd) => cmd,
        None => return print_help(),
    };

    // `init` and `help` must work even when the existing config does not load.
    match CommandRef::from_str(command_name).map(|c| c.primary) {
        Ok(PrimaryCommand::Init) => return init::run(cli),
        Ok(PrimaryCommand::Help) => return print_help(),
        _ => {}
    }

    let cfg = OpsflowConfig::load_or_default(&cli.config)
        .with_context(|| format!("unable to load config '{}'", cli.config))?;
    let registry = build_registry(&cfg);

    let invocation = resolve_invocation(&cfg, command_name, &cli.args)?;
    execute(cli, &cfg, &registry, &invocation)
}

fn build_registry(cfg: &OpsflowConfig) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::default();
    registry.register(Box::new(opsflow_ext_django::DjangoExtension::new(cfg)));
    registry.register(Box::new(opsflow_ext_systemd::SystemdExtension::new(cfg)));
    registry
}

/// Resolves the positional arguments into an invocation.
///
/// A complete mnemonic ignores any further arguments. A service command
/// without a selector (`restart`) takes the next argument as its service.
fn resolve_invocation(cfg: &OpsflowConfig, command: &str, args: &[String]) -> Result<Invocation> {
    let (invocation, consumed) = if let Some(name) = sequence_name(cfg, command) {
        (Invocation::Sequence(name), 0)
    } else {
        match CommandRef::from_str(command) {
            Ok(cmd) => (single(cmd), 0),
            Err(CommandParseError::MissingSelector(primary)) if !args.is_empty() => {
                let joined = format!("{}-{}", primary, args[0]);
                if opsflow_policy::is_sequence(cfg, &joined) {
                    (Invocation::Sequence(joined), 1)
                } else {
                    (single(CommandRef::from_str(&joined)?), 1)
                }
            }
            Err(err) => return Err(err.into()),
        }
    };

    if args.len() > consumed {
        debug!("ignoring extra arguments: {:?}", &args[consumed..]);
    }

    Ok(invocation)
}

/// Matches a configured sequence, accepting `restart:all` for `restart-all`.
fn sequence_name(cfg: &OpsflowConfig, text: &str) -> Option<String> {
    if opsflow_policy::is_sequence(cfg, text) {
        return Some(text.to_string());
    }
    let dashed = text.replacen(':', "-", 1);
    opsflow_policy::is_sequence(cfg, &dashed).then_some(dashed)
}

fn single(cmd: CommandRef) -> Invocation {
    if cmd.primary.is_builtin() {
        Invocation::Builtin(cmd.primary)
    } else {
        Invocation::Single(cmd)
    }
}

/// Resolves every command of an invocation to its action before anything runs.
fn plan(
    cfg: &OpsflowConfig,
    registry: &ExtensionRegistry,
    invocation: &Invocation,
) -> Result<Vec<Step>> {
    let commands = match invocation {
        Invocation::Builtin(_) => Vec::new(),
        Invocation::Single(cmd) => vec![cmd.clone()],
        Invocation::Sequence(name) => opsflow_policy::resolve_sequence(cfg, name)?,
    };

    commands
        .into_iter()
        .map(|cmd| -> Result<Step> {
            registry.ensure_can_run(&cmd)?;
            let action = registry.resolve(&cmd)?;
            Ok(Step {
                command: cmd.canonical(),
                action,
            })
        })
        .collect()
}

/// Executes a resolved invocation.
fn execute(
    cli: &Cli,
    cfg: &OpsflowConfig,
    registry: &ExtensionRegistry,
    invocation: &Invocation,
) -> Result<()> {
    match invocation {
        Invocation::Builtin(PrimaryCommand::Init) => init::run(cli),
        Invocation::Builtin(PrimaryCommand::Help) => print_help(),
        Invocation::Builtin(_) => {
            let colored = cli.format == OutputFormat::Text && std::io::stdout().is_terminal();
            print!("{}", listing::render(cfg, cli.format, colored)?);
            Ok(())
        }
        Invocation::Single(_) | Invocation::Sequence(_) => {
            let steps = plan(cfg, registry, invocation)?;
            if cli.dry_run {
                println!("{}", executor::render(&steps, cli.format)?);
                return Ok(());
            }
            executor::run(&cfg.project.root, &steps)?;
            Ok(())
        }
    }
}
