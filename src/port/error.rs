//! Console transport error types.
//!
//! Kept separate from the driver and runner errors so a transport can be
//! swapped (serial, child process, mock) without touching the layers above.

use thiserror::Error;

/// Errors that can occur while talking to a console transport.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The device console closed its output (process exited, cable gone).
    #[error("Console closed by the device")]
    Closed,

    /// The DUT console process could not be started.
    #[error("Failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True when the error only means "nothing arrived yet".
    ///
    /// Serial ports report an elapsed read timeout as `TimedOut`, the mock
    /// port reports an empty queue as `WouldBlock`.
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
