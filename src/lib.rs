// ABOUTME: Library root for remexec - one-shot remote command execution over SSH.
// ABOUTME: The CLI binary is in main.rs.

pub mod config;
pub mod error;
pub mod exec;
pub mod output;
pub mod rpc;
pub mod ssh;
pub mod types;

pub use exec::{CommandResult, ConnectionRequest, ExecError, RemoteCommandClient};
