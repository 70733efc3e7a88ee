use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG;

#[derive(Parser)]
#[command(name = "clover")]
#[command(version)]
#[command(about = "Declarative Vagrant machines: boot, deploy files, provision, verify", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or re-provision machines, deploy files and run provisioners
    Converge(TargetArgs),

    /// Run each node's verifier against its machine
    Verify(TargetArgs),

    /// Show the machine status of every node
    Status(StatusArgs),

    /// Destroy all machines and remove generated state
    Destroy(DestroyArgs),

    /// Open an interactive shell on a node
    Ssh(SshArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Configuration file
    #[arg(env = "CLOVER_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Only this node (default: every node, in order)
    pub node: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Configuration file
    #[arg(env = "CLOVER_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Configuration file
    #[arg(env = "CLOVER_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct SshArgs {
    /// Node to connect to
    pub node: String,

    /// Configuration file
    #[arg(short, long, env = "CLOVER_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}
