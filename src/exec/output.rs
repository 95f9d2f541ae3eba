// ABOUTME: Command result type and the bounded buffers that fill it.
// ABOUTME: stdout and stderr are captured separately under one shared byte limit.

/// What a remote command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Everything the command wrote to standard output.
    pub stdout: String,
    /// Everything the command wrote to standard error.
    pub stderr: String,
    /// Exit status, if the server reported one.
    pub exit_status: Option<u32>,
    /// Name of the signal that terminated the command, if any.
    pub exit_signal: Option<String>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Returned when a push would take the capture past its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LimitExceeded {
    pub limit: usize,
}

pub(crate) struct OutputCapture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    limit: usize,
}

impl OutputCapture {
    pub fn new(limit: usize) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            limit,
        }
    }

    pub fn push_stdout(&mut self, data: &[u8]) -> Result<(), LimitExceeded> {
        self.reserve(data.len())?;
        self.stdout.extend_from_slice(data);
        Ok(())
    }

    pub fn push_stderr(&mut self, data: &[u8]) -> Result<(), LimitExceeded> {
        self.reserve(data.len())?;
        self.stderr.extend_from_slice(data);
        Ok(())
    }

    pub fn captured(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    fn reserve(&self, additional: usize) -> Result<(), LimitExceeded> {
        if self.captured().saturating_add(additional) > self.limit {
            return Err(LimitExceeded { limit: self.limit });
        }
        Ok(())
    }

    pub fn finish(self, exit_status: Option<u32>, exit_signal: Option<String>) -> CommandResult {
        CommandResult {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_status,
            exit_signal,
        }
    }
}
