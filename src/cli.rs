//! CLI argument parsing and command dispatch

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// git-fleet - Track one feature branch across many git repositories
#[derive(Parser, Debug)]
#[command(name = "git-fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Workspace directory containing .git-fleet.yaml
    #[arg(
        short,
        long,
        global = true,
        value_name = "DIR",
        env = "GIT_FLEET_WORKSPACE"
    )]
    workspace: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the status of every repository in the workspace
    Status(commands::status::StatusArgs),

    /// Fetch the share and base remotes of every repository
    Fetch(commands::fetch::FetchArgs),

    /// Predict merge and rebase conflicts against the base branch
    Conflicts(commands::conflicts::ConflictsArgs),

    /// Plan moving the feature branch onto a new base branch
    Retarget(commands::retarget::RetargetArgs),

    /// Print the JSON Schema of the machine-readable output
    Schema(commands::schema::SchemaArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Shared settings every command receives.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub workspace: Option<PathBuf>,
    pub color: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<ExitCode> {
        init_logging(&self.log_level);

        let global = GlobalArgs {
            workspace: self.workspace,
            color: self.color,
        };
        match self.command {
            Commands::Status(args) => commands::status::execute(args, &global),
            Commands::Fetch(args) => commands::fetch::execute(args, &global),
            Commands::Conflicts(args) => commands::conflicts::execute(args, &global),
            Commands::Retarget(args) => commands::retarget::execute(args, &global),
            Commands::Schema(args) => commands::schema::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Initialize `env_logger` at `level`; `RUST_LOG` takes precedence.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}",
                record.level().to_string().to_lowercase(),
                record.args()
            )
        })
        .try_init();
}
