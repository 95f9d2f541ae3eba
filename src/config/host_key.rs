// ABOUTME: Host key verification policy for SSH connections.
// ABOUTME: Verifying against known_hosts is the default; blind trust must be opted into.

use serde::Deserialize;
use std::path::PathBuf;

/// How the server's host key is checked before authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Check against a known_hosts file.
    KnownHosts {
        /// known_hosts file to use. `None` means `~/.ssh/known_hosts`.
        #[serde(default)]
        path: Option<PathBuf>,
        /// Accept and record keys of hosts that are not listed yet.
        /// A key that differs from a recorded one is always refused.
        #[serde(default)]
        trust_on_first_use: bool,
    },
    /// Accept whatever key the server presents.
    AcceptAny,
}

impl HostKeyPolicy {
    /// Only hosts already present in the default known_hosts file.
    pub fn strict() -> Self {
        HostKeyPolicy::KnownHosts {
            path: None,
            trust_on_first_use: false,
        }
    }

    /// Learn unknown hosts into the default known_hosts file.
    pub fn trust_on_first_use() -> Self {
        HostKeyPolicy::KnownHosts {
            path: None,
            trust_on_first_use: true,
        }
    }

    pub fn known_hosts_path(path: impl Into<PathBuf>) -> Self {
        HostKeyPolicy::KnownHosts {
            path: Some(path.into()),
            trust_on_first_use: false,
        }
    }

    pub fn verifies(&self) -> bool {
        !matches!(self, HostKeyPolicy::AcceptAny)
    }
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        Self::strict()
    }
}
