// ABOUTME: Command module aggregator for the remexec CLI.
// ABOUTME: Re-exports run and serve command handlers.

mod run;
mod serve;

pub use run::run_command;
pub use serve::serve_stdio;
