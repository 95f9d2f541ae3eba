// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use remexec::output::OutputMode;
use remexec::types::Target;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "remexec")]
#[command(about = "Run a single command on a remote host over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: remexec.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new remexec.yml configuration file
    Init {
        /// Overwrite an existing remexec.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Run a command on a remote host and print its output
    Run(RunArgs),

    /// Answer execute calls as JSON lines on stdin/stdout
    Serve,
}

#[derive(Args)]
pub struct RunArgs {
    /// Remote host as [user@]host[:port]
    pub target: Target,

    /// Username (overrides the one in the target)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(long, env = "REMEXEC_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Bound on the whole invocation, e.g. "30s" or "2m"
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Maximum captured output in bytes
    #[arg(long)]
    pub max_output: Option<usize>,

    /// Skip host key verification entirely
    #[arg(long, conflicts_with = "trust_on_first_use")]
    pub accept_any_host_key: bool,

    /// Accept and record host keys of hosts not seen before
    #[arg(long)]
    pub trust_on_first_use: bool,

    /// known_hosts file to verify against instead of the configured one
    #[arg(long, value_name = "PATH", conflicts_with = "accept_any_host_key")]
    pub known_hosts: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputMode::Normal)]
    pub output: OutputMode,

    /// Command to run on the remote host
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
