//! Console transports for the device under test.
//!
//! Hardware targets talk over a serial port, emulated and host-simulation
//! targets over a child process's stdio, and tests over a scripted mock. All
//! three implement [`SerialPortAdapter`].

pub mod error;
pub mod mock;
#[cfg(unix)]
pub mod process;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
#[cfg(unix)]
pub use process::ProcessPort;
pub use sync_port::{list_ports, PortSummary, SyncSerialPort};
pub use traits::*;
