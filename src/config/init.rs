// ABOUTME: Config scaffolding.
// ABOUTME: Creates a commented remexec.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, ClientConfig};

/// Write a template config into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<std::path::PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&ClientConfig::default());
    std::fs::write(&config_path, yaml)?;

    Ok(config_path)
}

fn generate_template_yaml(config: &ClientConfig) -> String {
    format!(
        r#"# Bound on establishing the TCP connection and SSH handshake
connect_timeout: {}
# Bound on a whole invocation (connect, auth, execute, drain)
timeout: {}
# Maximum captured output in bytes (stdout and stderr combined)
max_output: {}
host_key:
  policy: known_hosts
  # path: /home/me/.ssh/known_hosts
  # Set to true to accept and record keys of hosts not seen before
  trust_on_first_use: false
  # To skip verification entirely (not recommended):
  # policy: accept_any
"#,
        humantime::format_duration(config.connect_timeout),
        humantime::format_duration(config.timeout),
        config.max_output,
    )
}
