// ABOUTME: Traits describing the calls the client makes into an SSH engine.
// ABOUTME: Connect, authenticate, open an exec channel, read events, disconnect.

use super::error::Result;
use crate::config::HostKeyPolicy;
use async_trait::async_trait;
use bytes::Bytes;

/// Something read from an exec channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Bytes written to the remote standard output.
    Stdout(Bytes),
    /// Bytes written to the remote standard error.
    Stderr(Bytes),
    /// The remote command exited with this status.
    ExitStatus(u32),
    /// The remote command was killed by a signal.
    ExitSignal(String),
    /// The server refused the exec request.
    Rejected,
    /// The remote side will send no more data.
    Eof,
    /// The remote side closed the channel.
    Close,
}

/// Opens authenticated-to-be transport sessions.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Session: SshSession;

    /// Establish a transport connection and verify the server's host key.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        host_key: &HostKeyPolicy,
    ) -> Result<Self::Session>;
}

/// A connected transport, exclusively owned by one invocation.
#[async_trait]
pub trait SshSession: Send + 'static {
    type Channel: ExecChannel;

    /// Try password authentication. `Ok(false)` means the server said no.
    async fn authenticate_password(&mut self, user: &str, password: &str) -> Result<bool>;

    /// Open the single session channel used to run the command.
    async fn open_exec_channel(&mut self) -> Result<Self::Channel>;

    /// Tear down the transport.
    async fn disconnect(self) -> Result<()>;
}

/// A session channel bound to one remote command.
#[async_trait]
pub trait ExecChannel: Send + 'static {
    /// Start `command` on the remote side.
    async fn exec(&mut self, command: &str) -> Result<()>;

    /// Wait for the next event. `None` once the channel is gone.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    /// Close the channel.
    async fn close(self) -> Result<()>;
}
