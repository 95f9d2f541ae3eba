// ABOUTME: Remote command execution over a one-shot SSH session.
// ABOUTME: Exports the client, its request/result types and the error taxonomy.

mod client;
mod error;
mod output;
mod phase;
mod request;

pub use client::RemoteCommandClient;
pub use error::{ErrorCode, ExecError};
pub use output::CommandResult;
pub use phase::{Outcome, Phase};
pub use request::{ConnectionRequest, RequestError};
