// ABOUTME: Run command implementation.
// ABOUTME: Executes one command on a remote host and mirrors its output and exit status.

use crate::cli::RunArgs;
use remexec::config::{ClientConfig, HostKeyPolicy};
use remexec::error::Result;
use remexec::exec::{ConnectionRequest, RemoteCommandClient};
use remexec::output::Output;
use std::env;
use tokio_util::sync::CancellationToken;

/// Exit code when the command could not be run at all, as ssh(1) does.
const EXIT_SSH_FAILURE: i32 = 255;

/// Run the command and return the exit code the process should end with.
pub async fn run_command(config: ClientConfig, args: RunArgs) -> Result<i32> {
    let mut output = Output::new(args.output);
    let config = apply_overrides(config, &args);
    config.validate()?;

    let user = args
        .user
        .clone()
        .or_else(|| args.target.user().map(str::to_string))
        .unwrap_or_else(|| env::var("USER").unwrap_or_else(|_| "root".to_string()));

    let mut request = ConnectionRequest::new(
        args.target.host(),
        user,
        args.password,
        args.command.join(" "),
    )
    .port(args.target.port());
    if let Some(timeout) = args.timeout {
        request = request.timeout(timeout);
    }

    output.progress(&format!("  → Connecting to {}...", args.target));
    output.start_timer();

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let client = RemoteCommandClient::new(config);
    let result = client.execute_with_cancel(request, cancel).await;
    ctrl_c.abort();

    match result {
        Ok(result) => {
            output.result(&result);
            Ok(match (result.exit_status, &result.exit_signal) {
                (Some(status), _) => status as i32,
                (None, Some(_)) => EXIT_SSH_FAILURE,
                (None, None) => 0,
            })
        }
        Err(e) => {
            output.error(Some(e.code().as_str()), &e.to_string());
            Ok(EXIT_SSH_FAILURE)
        }
    }
}

fn apply_overrides(mut config: ClientConfig, args: &RunArgs) -> ClientConfig {
    if let Some(max_output) = args.max_output {
        config = config.max_output(max_output);
    }

    if args.accept_any_host_key {
        config = config.host_key(HostKeyPolicy::AcceptAny);
    } else if args.trust_on_first_use || args.known_hosts.is_some() {
        let policy = known_hosts_policy(&config.host_key, args);
        config = config.host_key(policy);
    }

    config
}

/// Merge the known_hosts flags into the configured policy.
fn known_hosts_policy(configured: &HostKeyPolicy, args: &RunArgs) -> HostKeyPolicy {
    let (configured_path, configured_tofu) = match configured {
        HostKeyPolicy::KnownHosts {
            path,
            trust_on_first_use,
        } => (path.clone(), *trust_on_first_use),
        HostKeyPolicy::AcceptAny => (None, false),
    };
    let path = args.known_hosts.clone().or(configured_path);
    let trust_on_first_use = args.trust_on_first_use || configured_tofu;

    match (path, trust_on_first_use) {
        (Some(path), false) => HostKeyPolicy::known_hosts_path(path),
        (None, true) => HostKeyPolicy::trust_on_first_use(),
        (None, false) => HostKeyPolicy::strict(),
        (path, true) => HostKeyPolicy::KnownHosts {
            path,
            trust_on_first_use: true,
        },
    }
}
