// ABOUTME: russh-backed implementation of the SSH engine traits.
// ABOUTME: Handles connection, host key verification, password auth and exec channels.

use super::engine::{ChannelEvent, Connector, ExecChannel, SshSession};
use super::error::{Error, Result};
use crate::config::HostKeyPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use russh::client::{self, Config, Handle, Msg};
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::ssh_key;
use russh::{Channel, ChannelMsg, Disconnect, Sig};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Extended data type code for stderr (RFC 4254 section 5.2).
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// SSH client handler for russh.
pub(crate) struct SshHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    /// Set when the server key is refused, so the connect error can be told apart.
    rejected: Arc<AtomicBool>,
}

impl SshHandler {
    fn new(host: String, port: u16, policy: HostKeyPolicy, rejected: Arc<AtomicBool>) -> Self {
        Self {
            host,
            port,
            policy,
            rejected,
        }
    }

    fn verify_known_hosts(
        &self,
        path: Option<&Path>,
        trust_on_first_use: bool,
        server_public_key: &ssh_key::PublicKey,
    ) -> bool {
        let check_result = match path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match check_result {
            Ok(true) => true,
            Ok(false) if trust_on_first_use => {
                tracing::warn!(
                    "Trust-On-First-Use: accepting unknown host key for {}:{}",
                    self.host,
                    self.port
                );
                let learn_result = match path {
                    Some(path) => {
                        learn_known_hosts_path(&self.host, self.port, server_public_key, path)
                    }
                    None => learn_known_hosts(&self.host, self.port, server_public_key),
                };
                if let Err(e) = learn_result {
                    tracing::warn!("Failed to save host key to known_hosts: {}", e);
                }
                true
            }
            Ok(false) => {
                tracing::debug!("Unknown host key for {}:{}", self.host, self.port);
                false
            }
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::warn!(
                    "Host key for {}:{} does not match known_hosts",
                    self.host,
                    self.port
                );
                false
            }
            // Unreadable known_hosts counts as an unknown host
            Err(e) => {
                tracing::debug!("known_hosts check failed: {}", e);
                trust_on_first_use
            }
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match &self.policy {
            HostKeyPolicy::AcceptAny => {
                tracing::warn!(
                    "Host key verification disabled: accepting any key for {}:{}",
                    self.host,
                    self.port
                );
                true
            }
            HostKeyPolicy::KnownHosts {
                path,
                trust_on_first_use,
            } => self.verify_known_hosts(path.as_deref(), *trust_on_first_use, server_public_key),
        };

        if !accepted {
            self.rejected.store(true, Ordering::SeqCst);
        }
        Ok(accepted)
    }
}

/// Opens SSH sessions with russh.
#[derive(Debug, Clone)]
pub struct RusshConnector {
    inactivity_timeout: Duration,
}

impl RusshConnector {
    pub fn new() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(30),
        }
    }

    /// Drop the connection after this long without traffic.
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }
}

impl Default for RusshConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for RusshConnector {
    type Session = RusshSession;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        host_key: &HostKeyPolicy,
    ) -> Result<Self::Session> {
        let russh_config = Config {
            inactivity_timeout: Some(self.inactivity_timeout),
            ..Default::default()
        };

        let rejected = Arc::new(AtomicBool::new(false));
        let handler = SshHandler::new(
            host.to_string(),
            port,
            host_key.clone(),
            Arc::clone(&rejected),
        );

        let handle = client::connect(Arc::new(russh_config), (host, port), handler)
            .await
            .map_err(|e| {
                if rejected.load(Ordering::SeqCst) {
                    Error::HostKeyRejected {
                        host: host.to_string(),
                        port,
                    }
                } else if e.to_string().contains("Connection refused") {
                    Error::Connection(format!("connection refused to {}:{}", host, port))
                } else {
                    Error::Connection(e.to_string())
                }
            })?;

        Ok(RusshSession { handle })
    }
}

/// An established russh session.
pub struct RusshSession {
    handle: Handle<SshHandler>,
}

impl std::fmt::Debug for RusshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusshSession")
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

#[async_trait]
impl SshSession for RusshSession {
    type Channel = RusshChannel;

    async fn authenticate_password(&mut self, user: &str, password: &str) -> Result<bool> {
        let result = self
            .handle
            .authenticate_password(user, password)
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;
        Ok(result.success())
    }

    async fn open_exec_channel(&mut self) -> Result<Self::Channel> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Channel(format!("failed to open channel: {}", e)))?;
        Ok(RusshChannel { channel })
    }

    async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)?;
        Ok(())
    }
}

/// A russh session channel running one command.
pub struct RusshChannel {
    channel: Channel<Msg>,
}

#[async_trait]
impl ExecChannel for RusshChannel {
    async fn exec(&mut self, command: &str) -> Result<()> {
        self.channel.exec(true, command).await.map_err(Error::Protocol)
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let event = match self.channel.wait().await? {
                ChannelMsg::Data { data } => ChannelEvent::Stdout(Bytes::copy_from_slice(&data)),
                ChannelMsg::ExtendedData { data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    ChannelEvent::Stderr(Bytes::copy_from_slice(&data))
                }
                ChannelMsg::ExitStatus { exit_status } => ChannelEvent::ExitStatus(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    ChannelEvent::ExitSignal(signal_label(signal_name))
                }
                ChannelMsg::Failure => ChannelEvent::Rejected,
                ChannelMsg::Eof => ChannelEvent::Eof,
                ChannelMsg::Close => ChannelEvent::Close,
                _ => continue,
            };
            return Some(event);
        }
    }

    async fn close(self) -> Result<()> {
        self.channel.close().await.map_err(Error::Protocol)
    }
}

/// Bare signal name as sent on the wire, e.g. `TERM` or `USR2`.
fn signal_label(signal: Sig) -> String {
    match signal {
        Sig::Custom(name) => name,
        other => format!("{:?}", other),
    }
}
