// ABOUTME: Connection request for a single remote command invocation.
// ABOUTME: Carries target, credentials, command line and an optional overall timeout.

use secrecy::{Secret, SecretString};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("host cannot be empty")]
    EmptyHost,

    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(i64),

    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Everything needed to run one command on one host.
///
/// A request is consumed by the invocation that runs it. The password is kept
/// in a [`SecretString`] so it never shows up in `Debug` output or logs.
#[derive(Debug)]
pub struct ConnectionRequest {
    /// Remote host name or address.
    pub host: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Username for password authentication.
    pub username: String,
    /// Password; may be empty if the server allows it.
    pub password: SecretString,
    /// Command line passed verbatim to the remote side.
    pub command: String,
    /// Bound on the whole invocation. `None` uses the client default.
    pub timeout: Option<Duration>,
}

impl ConnectionRequest {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: Secret::new(password.into()),
            command: command.into(),
            timeout: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bound the whole invocation: connect, auth, execute and drain.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.host.trim().is_empty() {
            return Err(RequestError::EmptyHost);
        }
        if self.port == 0 {
            return Err(RequestError::InvalidPort(0));
        }
        if self.username.is_empty() {
            return Err(RequestError::EmptyUsername);
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(RequestError::ZeroTimeout);
        }
        Ok(())
    }
}
