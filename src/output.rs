// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (scripts), and JSON output modes.

use crate::exec::CommandResult;
use serde::Serialize;
use std::io::Write;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// Remote output plus progress messages on stderr
    #[default]
    Normal,
    /// Remote output only
    Quiet,
    /// One JSON object per event
    Json,
}

/// Handles CLI output based on the configured mode.
///
/// Remote stdout always goes to our stdout untouched in normal and quiet
/// mode; everything else goes to stderr.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration_secs(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            eprintln!("{message}");
        }
    }

    /// Print what the remote command produced.
    pub fn result(&self, result: &CommandResult) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                print!("{}", result.stdout);
                let _ = std::io::stdout().flush();
                eprint!("{}", result.stderr);
                if self.mode == OutputMode::Normal {
                    if let Some(signal) = &result.exit_signal {
                        eprintln!("remote command killed by signal {signal}");
                    }
                }
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "result",
                    stdout: Some(&result.stdout),
                    stderr: Some(&result.stderr),
                    exit_status: result.exit_status,
                    exit_signal: result.exit_signal.as_deref(),
                    code: None,
                    message: None,
                    duration_secs: self.duration_secs(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message, with its machine-readable code when there is one.
    pub fn error(&self, code: Option<&str>, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    stdout: None,
                    stderr: None,
                    exit_status: None,
                    exit_signal: None,
                    code,
                    message: Some(message),
                    duration_secs: self.duration_secs(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_status: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_signal: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
