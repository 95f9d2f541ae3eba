// ABOUTME: Error taxonomy for remote command invocations.
// ABOUTME: Each kind maps to a stable machine-readable code.

use super::phase::Phase;
use super::request::RequestError;
use crate::ssh;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Why an invocation failed. Resources are always released before one of
/// these reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// Transport could not be established: DNS, refusal, or connect timeout.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server's host key did not pass the configured policy.
    #[error("host key for {host}:{port} was rejected")]
    HostKeyRejected { host: String, port: u16 },

    /// Credentials were refused.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Authenticated, but no exec channel could be opened.
    #[error("failed to open exec channel: {0}")]
    Channel(String),

    /// The exec request itself failed at the protocol level.
    #[error("command execution failed: {0}")]
    Execution(String),

    #[error("output exceeded limit of {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("timed out after {after:?} while {phase}")]
    Timeout { phase: Phase, after: Duration },

    #[error("cancelled while {phase}")]
    Cancelled { phase: Phase },
}

impl ExecError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ExecError::Connect(_) => ErrorCode::ConnectError,
            ExecError::HostKeyRejected { .. } => ErrorCode::HostKeyRejected,
            ExecError::Auth(_) => ErrorCode::AuthError,
            ExecError::Channel(_) => ErrorCode::ChannelError,
            ExecError::Execution(_) => ErrorCode::ExecutionError,
            ExecError::OutputTooLarge { .. } => ErrorCode::OutputTooLarge,
            ExecError::Timeout { .. } => ErrorCode::Timeout,
            ExecError::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }

    pub(crate) fn connect(err: ssh::Error) -> Self {
        match err {
            ssh::Error::HostKeyRejected { host, port } => ExecError::HostKeyRejected { host, port },
            other => ExecError::Connect(detail(other)),
        }
    }

    pub(crate) fn auth(err: ssh::Error) -> Self {
        ExecError::Auth(detail(err))
    }

    pub(crate) fn channel(err: ssh::Error) -> Self {
        ExecError::Channel(detail(err))
    }

    pub(crate) fn execution(err: ssh::Error) -> Self {
        ExecError::Execution(detail(err))
    }
}

/// Strip the engine's own prefix so messages don't read "connection failed: connection failed: ...".
fn detail(err: ssh::Error) -> String {
    match err {
        ssh::Error::Connection(msg) | ssh::Error::Authentication(msg) | ssh::Error::Channel(msg) => {
            msg
        }
        other => other.to_string(),
    }
}

/// Stable identifiers for [`ExecError`] kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    ConnectError,
    HostKeyRejected,
    AuthError,
    ChannelError,
    ExecutionError,
    OutputTooLarge,
    Timeout,
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::HostKeyRejected => "HOST_KEY_REJECTED",
            ErrorCode::AuthError => "AUTH_ERROR",
            ErrorCode::ChannelError => "CHANNEL_ERROR",
            ErrorCode::ExecutionError => "EXECUTION_ERROR",
            ErrorCode::OutputTooLarge => "OUTPUT_TOO_LARGE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
