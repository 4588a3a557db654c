//! Serial console transport for hardware targets.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter` trait so the driver never sees the concrete backend.

use super::error::PortError;
use super::traits::{PortConfiguration, SerialPortAdapter};
use serde::Serialize;
use serialport::SerialPortType;
use std::io::{Read, Write};

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use unity_hil::port::{SyncSerialPort, PortConfiguration};
    ///
    /// let config = PortConfiguration::default();
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", config)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        tracing::debug!(port = port_name, baud = config.baud_rate, "serial console opened");

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let n = self.port.write(data).map_err(PortError::Io)?;
        self.port.flush().map_err(PortError::Io)?;
        Ok(n)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// One entry of the `--list-ports` output.
#[derive(Debug, Clone, Serialize)]
pub struct PortSummary {
    pub port_name: String,
    pub kind: String,
    pub vid_pid: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// Enumerate serial ports the system currently exposes.
pub fn list_ports() -> Result<Vec<PortSummary>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| match info.port_type {
            SerialPortType::UsbPort(usb) => PortSummary {
                port_name: info.port_name,
                kind: "usb".to_string(),
                vid_pid: Some(format!("{:04x}:{:04x}", usb.vid, usb.pid)),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            other => PortSummary {
                port_name: info.port_name,
                kind: match other {
                    SerialPortType::PciPort => "pci",
                    SerialPortType::BluetoothPort => "bluetooth",
                    _ => "unknown",
                }
                .to_string(),
                vid_pid: None,
                manufacturer: None,
                product: None,
            },
        })
        .collect())
}
