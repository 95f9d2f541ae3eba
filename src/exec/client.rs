// ABOUTME: RemoteCommandClient: one SSH session per command, always torn down.
// ABOUTME: Drives connect, auth, channel, exec and drain under timeout and cancellation.

use super::error::ExecError;
use super::output::{CommandResult, OutputCapture};
use super::phase::{Outcome, Phase};
use super::request::ConnectionRequest;
use crate::config::ClientConfig;
use crate::ssh::{ChannelEvent, Connector, ExecChannel, RusshConnector, SshSession};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Upper bound on closing the channel and disconnecting the session.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs single commands on remote hosts.
///
/// Every call opens its own session and releases it before returning, so a
/// client can be cloned and used from many tasks at once.
pub struct RemoteCommandClient<C: Connector = RusshConnector> {
    connector: Arc<C>,
    config: Arc<ClientConfig>,
}

impl<C: Connector> Clone for RemoteCommandClient<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: Connector> std::fmt::Debug for RemoteCommandClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCommandClient")
            .field("config", &self.config)
            .finish()
    }
}

impl RemoteCommandClient<RusshConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(RusshConnector::new(), config)
    }
}

impl<C: Connector> RemoteCommandClient<C> {
    pub fn with_connector(connector: C, config: ClientConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run `request.command` on the remote host and collect its output.
    pub async fn execute(&self, request: ConnectionRequest) -> Result<CommandResult, ExecError> {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Run the request on a background task.
    pub fn spawn(
        &self,
        request: ConnectionRequest,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<CommandResult, ExecError>> {
        let client = self.clone();
        tokio::spawn(async move { client.execute_with_cancel(request, cancel).await })
    }

    /// Like [`execute`](Self::execute), aborting when `cancel` fires.
    ///
    /// Cancellation and timeouts drop whatever phase is in flight; the session
    /// and channel opened so far are still closed before the error is returned.
    pub async fn execute_with_cancel(
        &self,
        request: ConnectionRequest,
        cancel: CancellationToken,
    ) -> Result<CommandResult, ExecError> {
        request.validate()?;

        let deadline = request.timeout.unwrap_or(self.config.timeout);
        let mut resources = Resources::<C::Session>::new();

        tracing::debug!(
            "Running command on {}@{}:{}",
            request.username,
            request.host,
            request.port
        );

        let completion = {
            let phases = self.run_phases(&request, &mut resources);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Completion::Cancelled,
                result = timeout(deadline, phases) => match result {
                    Ok(result) => Completion::Finished(result),
                    Err(_) => Completion::TimedOut,
                },
            }
        };

        let phase = resources.phase;
        let result = match completion {
            Completion::Finished(result) => result,
            // A deadline hit before the transport is up is a connect failure
            Completion::TimedOut if matches!(phase, Phase::Idle | Phase::Connecting) => {
                Err(ExecError::Connect(format!(
                    "connection to {}:{} timed out after {:?}",
                    request.host, request.port, deadline
                )))
            }
            Completion::TimedOut => Err(ExecError::Timeout {
                phase,
                after: deadline,
            }),
            Completion::Cancelled => Err(ExecError::Cancelled { phase }),
        };

        resources.release().await;

        let outcome = if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failed
        };
        transition(&mut resources.phase, Phase::Closed(outcome));

        result
    }

    async fn run_phases(
        &self,
        request: &ConnectionRequest,
        resources: &mut Resources<C::Session>,
    ) -> Result<CommandResult, ExecError> {
        transition(&mut resources.phase, Phase::Connecting);
        let connect = self
            .connector
            .connect(&request.host, request.port, &self.config.host_key);
        let session = match timeout(self.config.connect_timeout, connect).await {
            Ok(session) => session.map_err(ExecError::connect)?,
            Err(_) => {
                return Err(ExecError::Connect(format!(
                    "connection to {}:{} timed out after {:?}",
                    request.host, request.port, self.config.connect_timeout
                )));
            }
        };
        let session = resources.session.insert(session);

        transition(&mut resources.phase, Phase::Authenticating);
        let accepted = session
            .authenticate_password(&request.username, request.password.expose_secret())
            .await
            .map_err(ExecError::auth)?;
        if !accepted {
            return Err(ExecError::Auth(format!(
                "server rejected password for user '{}'",
                request.username
            )));
        }

        transition(&mut resources.phase, Phase::OpeningChannel);
        let channel = session
            .open_exec_channel()
            .await
            .map_err(ExecError::channel)?;
        let channel = resources.channel.insert(channel);

        transition(&mut resources.phase, Phase::Executing);
        channel
            .exec(&request.command)
            .await
            .map_err(ExecError::execution)?;

        transition(&mut resources.phase, Phase::Draining);
        drain(channel, self.config.max_output).await
    }
}

enum Completion {
    Finished(Result<CommandResult, ExecError>),
    TimedOut,
    Cancelled,
}

/// The session and channel an invocation has opened so far.
struct Resources<S: SshSession> {
    session: Option<S>,
    channel: Option<S::Channel>,
    phase: Phase,
}

impl<S: SshSession> Resources<S> {
    fn new() -> Self {
        Self {
            session: None,
            channel: None,
            phase: Phase::Idle,
        }
    }

    /// Close the channel, then the session. Failures are logged, not returned.
    async fn release(&mut self) {
        if let Some(channel) = self.channel.take() {
            match timeout(TEARDOWN_TIMEOUT, channel.close()).await {
                Ok(Ok(())) => {}
                // The remote side usually closed it already
                Ok(Err(e)) => tracing::debug!("Channel close failed: {}", e),
                Err(_) => tracing::warn!("Channel close timed out after {:?}", TEARDOWN_TIMEOUT),
            }
        }

        if let Some(session) = self.session.take() {
            match timeout(TEARDOWN_TIMEOUT, session.disconnect()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("SSH disconnect failed: {}", e),
                Err(_) => tracing::warn!("SSH disconnect timed out after {:?}", TEARDOWN_TIMEOUT),
            }
        }
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    tracing::debug!("{} -> {}", phase, next);
    *phase = next;
}

/// Read the channel until the remote side is done with it.
async fn drain<Ch: ExecChannel>(channel: &mut Ch, limit: usize) -> Result<CommandResult, ExecError> {
    let mut capture = OutputCapture::new(limit);
    let mut exit_status = None;
    let mut exit_signal = None;
    let mut got_eof = false;

    while let Some(event) = channel.next_event().await {
        match event {
            ChannelEvent::Stdout(data) => capture
                .push_stdout(&data)
                .map_err(|e| ExecError::OutputTooLarge { limit: e.limit })?,
            ChannelEvent::Stderr(data) => capture
                .push_stderr(&data)
                .map_err(|e| ExecError::OutputTooLarge { limit: e.limit })?,
            ChannelEvent::ExitStatus(status) => {
                exit_status = Some(status);
                if got_eof {
                    break;
                }
            }
            ChannelEvent::ExitSignal(signal) => exit_signal = Some(signal),
            ChannelEvent::Rejected => {
                return Err(ExecError::Execution(
                    "server refused the exec request".to_string(),
                ));
            }
            ChannelEvent::Eof => {
                got_eof = true;
                if exit_status.is_some() {
                    break;
                }
            }
            ChannelEvent::Close => break,
        }
    }

    tracing::debug!(
        "Captured {} bytes, exit status {:?}",
        capture.captured(),
        exit_status
    );
    Ok(capture.finish(exit_status, exit_signal))
}
