//! Core traits for console transports.
//!
//! Defines the `SerialPortAdapter` trait that lets a real serial port, a
//! spawned emulator/host process, and the test mock be driven the same way.

use super::error::PortError;
use std::time::Duration;

/// Configuration parameters for a serial port.
#[derive(Debug, Clone)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Per-read timeout. Keep it short: the driver polls and owns the real
    /// expectation deadlines.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        // ESP-IDF console defaults: 115200 8N1.
        Self {
            baud_rate: 115200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(50),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Byte-stream console of a device under test.
///
/// Reads may return an "idle" error (see [`PortError::is_idle`]) when no
/// data is available yet; callers are expected to poll. `Ok(0)` means the
/// stream has ended and nothing more will arrive.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the console.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the console into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Human readable identification (port path or command line).
    fn name(&self) -> &str;

    /// Write the whole buffer, retrying on short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => return Err(PortError::Closed),
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

impl<P: SerialPortAdapter + ?Sized> SerialPortAdapter for Box<P> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).read_bytes(buffer)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
