//! Top-level error type of a runner invocation.
//!
//! Each layer keeps its own error enum (`PortError`, `DutError`,
//! `ConfigError`, `AssertionFailure`); `RunError` gathers them so the binary
//! can pick an exit code from the variant.

use crate::config::ConfigError;
use crate::dut::DutError;
use crate::port::PortError;
use crate::unity::AssertionFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// The summary was read but does not count as a pass.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The device never produced an expected pattern, or the console broke.
    #[error(transparent)]
    Device(#[from] DutError),

    /// The console could not be opened.
    #[error("Failed to connect to the device: {0}")]
    Connect(#[from] PortError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing the human-readable report failed.
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

impl RunError {
    /// Process exit code for this failure.
    ///
    /// 1 = tests failed, 2 = configuration or connection problem, 3 = the
    /// device misbehaved at run time.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Assertion(_) => 1,
            Self::Config(_) | Self::Connect(_) => 2,
            Self::Device(_) | Self::Output(_) => 3,
        }
    }
}

/// A specialized `Result` type for runner operations.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunError::from(AssertionFailure::NoTestsExecuted).exit_code(), 1);
        assert_eq!(RunError::from(PortError::not_found("COM9")).exit_code(), 2);
        assert_eq!(
            RunError::from(ConfigError::MissingRequired("serial.port".into())).exit_code(),
            2
        );

        let timeout = DutError::Timeout {
            pattern: "\"*\"".into(),
            timeout: Duration::from_secs(30),
            tail: String::new(),
        };
        assert_eq!(RunError::from(timeout).exit_code(), 3);
    }

    #[test]
    fn test_assertion_message_passes_through() {
        let err = RunError::from(AssertionFailure::TestsFailed { failures: 2 });
        assert_eq!(err.to_string(), "Unity tests failed with 2 failures");
    }
}
