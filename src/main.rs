mod ansible;
mod cli;
mod commands;
mod config;
mod converge;
mod progress;
mod project;
mod runner;
mod template;
#[cfg(test)]
mod testing;
mod ui;
mod verify;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            if let Some(hint) = converge::hint(&err) {
                ui::dim(hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Converge(args) => commands::converge::run(ctx, &args.config, args.node.as_deref()),
        Command::Verify(args) => commands::verify::run(ctx, &args.config, args.node.as_deref()),
        Command::Status(args) => commands::status::run(ctx, &args.config, args.json),
        Command::Destroy(args) => commands::destroy::run(ctx, &args.config, args.yes),
        Command::Ssh(args) => commands::ssh::run(ctx, &args.config, &args.node),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "clover", &mut io::stdout());
            Ok(())
        }
    }
}
