// ABOUTME: Lifecycle phases of a single remote command invocation.
// ABOUTME: Phases advance strictly in order and always end in Closed.

use std::fmt;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Where an invocation is in its lifecycle.
///
/// `Idle → Connecting → Authenticating → OpeningChannel → Executing →
/// Draining → Closed`. `Closed` can be entered from any phase and is only
/// reported after the session and channel have been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Authenticating,
    OpeningChannel,
    Executing,
    Draining,
    Closed(Outcome),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Connecting => write!(f, "connecting"),
            Phase::Authenticating => write!(f, "authenticating"),
            Phase::OpeningChannel => write!(f, "opening channel"),
            Phase::Executing => write!(f, "executing"),
            Phase::Draining => write!(f, "draining output"),
            Phase::Closed(Outcome::Success) => write!(f, "closed (success)"),
            Phase::Closed(Outcome::Failed) => write!(f, "closed (failed)"),
        }
    }
}
