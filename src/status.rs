//! Exit status codes for the CLI
//!
//! - 0: every request produced a response
//! - 1: any request failed (transport error, timeout, redirect budget, ...)

use std::process::{ExitCode, Termination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Error = 1,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self)
    }
}

impl ExitStatus {
    /// Error if any request of a run failed
    pub fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error
        }
    }
}
