//! Utility functions for hardware testing.

use std::env;
use std::time::Duration;
use unity_hil::port::{list_ports, PortSummary};
use unity_hil::{Dut, PortConfiguration, SyncSerialPort};

/// Board under test, from the environment.
pub struct TestBoard {
    pub port_name: String,
    pub baud_rate: u32,
}

impl TestBoard {
    /// `UNITY_HIL_TEST_PORT` (or `ESPPORT`) and optional `UNITY_HIL_TEST_BAUD`.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("UNITY_HIL_TEST_PORT")
            .or_else(|_| env::var("ESPPORT"))
            .ok()?;
        let baud_rate = env::var("UNITY_HIL_TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(115200);

        Some(Self {
            port_name,
            baud_rate,
        })
    }

    pub fn port_config(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            timeout: Duration::from_millis(100),
            ..PortConfiguration::default()
        }
    }

    /// Open the console and wrap it in a driver.
    pub fn open(&self) -> Dut<SyncSerialPort> {
        let port = SyncSerialPort::open(&self.port_name, self.port_config())
            .unwrap_or_else(|e| panic!("failed to open {}: {e}", self.port_name));
        Dut::new(port)
    }
}

/// Skip test if no board is configured.
pub fn board_or_skip() -> Option<TestBoard> {
    let board = TestBoard::from_env();
    if board.is_none() {
        println!("Skipping hardware test: UNITY_HIL_TEST_PORT not set");
    }
    board
}

pub fn print_available_ports() {
    let ports: Vec<PortSummary> = list_ports().unwrap_or_default();
    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }
    for p in &ports {
        println!("  {} ({})", p.port_name, p.kind);
    }
}
