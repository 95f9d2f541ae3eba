// ABOUTME: Client configuration types and parsing for remexec.yml.
// ABOUTME: Handles YAML parsing, defaults, discovery and validation.

mod host_key;
mod init;

pub use host_key::HostKeyPolicy;
pub use init::init_config;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "remexec.yml";
pub const CONFIG_FILENAME_ALT: &str = "remexec.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".remexec/config.yml";

/// Settings shared by every invocation a client makes.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Bound on establishing the transport connection.
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Bound on a whole invocation when the request does not carry one.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Maximum captured bytes, stdout and stderr combined.
    #[serde(default = "default_max_output")]
    pub max_output: usize,

    #[serde(default)]
    pub host_key: HostKeyPolicy,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_output() -> usize {
    8 * 1024 * 1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            timeout: default_timeout(),
            max_output: default_max_output(),
            host_key: HostKeyPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or the defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_output == 0 {
            return Err(Error::InvalidConfig(
                "max_output must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    pub fn host_key(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key = policy;
        self
    }
}
