// ABOUTME: Remote target addresses for SSH connections.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@[::1]:port".

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target cannot be empty")]
    Empty,

    #[error("hostname cannot be empty")]
    EmptyHost,

    #[error("username cannot be empty")]
    EmptyUser,

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("unterminated '[' in IPv6 address")]
    UnterminatedBracket,
}

/// Where to connect: `[user@]host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    user: Option<String>,
    host: String,
    port: u16,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        // The last '@' separates the user, so usernames may contain '@'
        let (user, rest) = match s.rfind('@') {
            Some(at_pos) => {
                let user = &s[..at_pos];
                if user.is_empty() {
                    return Err(TargetError::EmptyUser);
                }
                (Some(user), &s[at_pos + 1..])
            }
            None => (None, s),
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let close = bracketed
                .find(']')
                .ok_or(TargetError::UnterminatedBracket)?;
            let host = &bracketed[..close];
            let after = &bracketed[close + 1..];
            let port = match after.strip_prefix(':') {
                Some(port_str) => parse_port(port_str)?,
                None if after.is_empty() => DEFAULT_SSH_PORT,
                None => return Err(TargetError::InvalidPort(after.to_string())),
            };
            (host, port)
        } else if rest.matches(':').count() > 1 {
            // Bare IPv6 address without a port
            (rest, DEFAULT_SSH_PORT)
        } else if let Some(colon_pos) = rest.rfind(':') {
            (&rest[..colon_pos], parse_port(&rest[colon_pos + 1..])?)
        } else {
            (rest, DEFAULT_SSH_PORT)
        };

        if host.is_empty() {
            return Err(TargetError::EmptyHost);
        }

        Ok(Self {
            user: user.map(str::to_string),
            host: host.to_string(),
            port,
        })
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn parse_port(s: &str) -> Result<u16, TargetError> {
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err(TargetError::InvalidPort(s.to_string())),
        Ok(port) => Ok(port),
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
