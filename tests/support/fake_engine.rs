// ABOUTME: Scripted SSH engine double that records every open and close.
// ABOUTME: Lets tests assert that sessions and channels are always released.

use async_trait::async_trait;
use bytes::Bytes;
use remexec::config::HostKeyPolicy;
use remexec::ssh::{ChannelEvent, Connector, Error, ExecChannel, Result, SshSession};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Counts of resources opened and closed through the double.
#[derive(Debug, Default)]
pub struct Ledger {
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub channels_opened: AtomicUsize,
    pub channels_closed: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl Ledger {
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn channels_opened(&self) -> usize {
        self.channels_opened.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Every session and channel that was opened has been closed.
    pub fn assert_balanced(&self) {
        assert_eq!(
            self.sessions_opened.load(Ordering::SeqCst),
            self.sessions_closed.load(Ordering::SeqCst),
            "every session opened must be closed"
        );
        assert_eq!(
            self.channels_opened.load(Ordering::SeqCst),
            self.channels_closed.load(Ordering::SeqCst),
            "every channel opened must be closed"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Accept,
    Refuse,
    RejectHostKey,
    Hang,
}

/// What the fake server does at each phase.
#[derive(Debug, Clone)]
pub struct Script {
    pub connect: ConnectBehavior,
    pub password: String,
    pub fail_channel_open: bool,
    pub fail_exec: bool,
    pub events: Vec<ChannelEvent>,
    /// Keep the channel open forever once `events` run out.
    pub hang_after_events: bool,
}

impl Script {
    /// A server accepting `password` whose command prints `stdout` and exits 0.
    pub fn prints(stdout: &str) -> Self {
        Self {
            connect: ConnectBehavior::Accept,
            password: "correct".to_string(),
            fail_channel_open: false,
            fail_exec: false,
            events: vec![
                ChannelEvent::Stdout(Bytes::copy_from_slice(stdout.as_bytes())),
                ChannelEvent::ExitStatus(0),
                ChannelEvent::Eof,
                ChannelEvent::Close,
            ],
            hang_after_events: false,
        }
    }

    pub fn connect(mut self, behavior: ConnectBehavior) -> Self {
        self.connect = behavior;
        self
    }

    pub fn events(mut self, events: Vec<ChannelEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn hang_after_events(mut self) -> Self {
        self.hang_after_events = true;
        self
    }

    pub fn fail_channel_open(mut self) -> Self {
        self.fail_channel_open = true;
        self
    }

    pub fn fail_exec(mut self) -> Self {
        self.fail_exec = true;
        self
    }
}

pub struct FakeConnector {
    script: Script,
    ledger: Arc<Ledger>,
}

impl FakeConnector {
    pub fn new(script: Script) -> (Self, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::default());
        (
            Self {
                script,
                ledger: Arc::clone(&ledger),
            },
            ledger,
        )
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        _host_key: &HostKeyPolicy,
    ) -> Result<Self::Session> {
        match self.script.connect {
            ConnectBehavior::Accept => {
                self.ledger.sessions_opened.fetch_add(1, Ordering::SeqCst);
                Ok(FakeSession {
                    script: self.script.clone(),
                    ledger: Arc::clone(&self.ledger),
                })
            }
            ConnectBehavior::Refuse => Err(Error::Connection(format!(
                "connection refused to {}:{}",
                host, port
            ))),
            ConnectBehavior::RejectHostKey => Err(Error::HostKeyRejected {
                host: host.to_string(),
                port,
            }),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}

pub struct FakeSession {
    script: Script,
    ledger: Arc<Ledger>,
}

#[async_trait]
impl SshSession for FakeSession {
    type Channel = FakeChannel;

    async fn authenticate_password(&mut self, _user: &str, password: &str) -> Result<bool> {
        Ok(password == self.script.password)
    }

    async fn open_exec_channel(&mut self) -> Result<Self::Channel> {
        if self.script.fail_channel_open {
            return Err(Error::Channel("administratively prohibited".to_string()));
        }
        self.ledger.channels_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeChannel {
            events: self.script.events.clone().into(),
            hang_after_events: self.script.hang_after_events,
            fail_exec: self.script.fail_exec,
            ledger: Arc::clone(&self.ledger),
        })
    }

    async fn disconnect(self) -> Result<()> {
        self.ledger.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeChannel {
    events: VecDeque<ChannelEvent>,
    hang_after_events: bool,
    fail_exec: bool,
    ledger: Arc<Ledger>,
}

#[async_trait]
impl ExecChannel for FakeChannel {
    async fn exec(&mut self, command: &str) -> Result<()> {
        if self.fail_exec {
            return Err(Error::Channel("exec request could not be sent".to_string()));
        }
        self.ledger
            .commands
            .lock()
            .unwrap()
            .push(command.to_string());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            None if self.hang_after_events => std::future::pending().await,
            None => None,
        }
    }

    async fn close(self) -> Result<()> {
        self.ledger.channels_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
