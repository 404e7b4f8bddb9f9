//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::output::OutputContext;

/// Install the Sealights agent into a staged .NET Core application
#[derive(Parser)]
#[command(
    name = "sl-inject",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download the agent and wrap the launch command
    Run(commands::run::RunArgs),

    /// Show the effective Sealights configuration
    Resolve(commands::resolve::ResolveArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Run(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::run::run(&ctx, &args)
            }
            Command::Resolve(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::resolve::run(&ctx, &args, json)
            }
        }
    }
}
