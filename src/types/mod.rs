// ABOUTME: Validated domain types.
// ABOUTME: Remote targets parsed from user input.

mod target;

pub use target::{DEFAULT_SSH_PORT, Target, TargetError};
