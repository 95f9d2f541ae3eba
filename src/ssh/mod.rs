// ABOUTME: SSH engine module for remote command execution.
// ABOUTME: Defines the engine traits and their russh-backed implementation.

mod client;
mod engine;
mod error;

pub use client::{RusshChannel, RusshConnector, RusshSession};
pub use engine::{ChannelEvent, Connector, ExecChannel, SshSession};
pub use error::{Error, Result};
