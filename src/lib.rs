//! Unity HIL runner library
//!
//! Drives the Unity test menu of an embedded application over its console
//! (serial port, emulator or host process), runs every registered test and
//! judges the `X Tests Y Failures Z Ignored` summary.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `port`: Console transports (serial, process, mock)
//! - `dut`: Device session driver with `write` / `expect_exact` / `expect`
//! - `procedure`: The boot / menu / run-all sequence
//! - `unity`: Summary pattern, parsing and verdict
//! - `runner`: Connecting and running end to end
//! - `report`: JSON run report
//! - `target`: Target labels
//! - `error`: Top-level error type
//! - `logging`: Tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use unity_hil::{Dut, MenuProcedure, SyncSerialPort, PortConfiguration};
//!
//! let port = SyncSerialPort::open("/dev/ttyUSB0", PortConfiguration::default())?;
//! let mut dut = Dut::new(port);
//! let summary = MenuProcedure::default().run(&mut dut)?;
//! println!("{summary}");
//! summary.verdict()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dut;
pub mod error;
pub mod logging;
pub mod port;
pub mod procedure;
pub mod report;
pub mod runner;
pub mod target;
pub mod unity;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use dut::{Dut, DutError, Pattern, PatternMatch};
pub use error::{RunError, RunResult};
pub use port::{MockSerialPort, PortConfiguration, PortError, SerialPortAdapter, SyncSerialPort};
#[cfg(unix)]
pub use port::ProcessPort;
pub use procedure::{MenuOutcome, MenuProcedure};
pub use report::{RunReport, Verdict};
pub use target::Target;
pub use unity::{AssertionFailure, UnitySummary};
