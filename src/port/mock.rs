//! Scripted console for exercising the driver and the procedure without a
//! device.
//!
//! The mock keeps a read queue (bytes the "device" has printed) and a reply
//! script: every write pops the next scripted reaction and appends it to the
//! read queue, so a test can describe a whole boot-menu-summary transcript
//! up front.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes returned by read operations.
    read_queue: VecDeque<u8>,
    /// Reactions to upcoming writes, in order. `None` means the device
    /// ignores that write.
    replies: VecDeque<Option<Vec<u8>>>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Whether the next operation should time out.
    should_timeout: bool,
    /// Report end-of-stream once the read queue drains.
    closed: bool,
    /// Duration reported by simulated timeouts.
    timeout: Duration,
}

/// In-memory console used by tests.
///
/// Clones share state, so a test can hand one clone to the driver and keep
/// another to inspect the write log afterwards.
///
/// # Example
/// ```
/// use unity_hil::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Press ENTER to see the list of tests.\n");
/// port.queue_reply(b"Here's the test menu, pick your combo:\n");
///
/// port.write_bytes(b"\r\n").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"\r\n".to_vec()]);
/// assert!(port.available_bytes() > 40);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock console with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(50),
                ..Default::default()
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// The next unscripted write makes the device print `data`.
    pub fn queue_reply(&mut self, data: &[u8]) {
        self.state.lock().replies.push_back(Some(data.to_vec()));
    }

    /// The next unscripted write gets no reaction from the device.
    pub fn queue_silence(&mut self) {
        self.state.lock().replies.push_back(None);
    }

    /// Number of scripted reactions not yet consumed by writes.
    pub fn pending_replies(&self) -> usize {
        self.state.lock().replies.len()
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Simulate the device going away: reads return end-of-stream once the
    /// queued bytes are drained.
    pub fn close(&mut self) {
        self.state.lock().closed = true;
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }
        if state.closed {
            return Err(PortError::Closed);
        }

        state.write_log.push(data.to_vec());

        if let Some(Some(reply)) = state.replies.pop_front() {
            state.read_queue.extend(reply);
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        let n = buffer.len().min(state.read_queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..n)) {
            *slot = byte;
        }

        if n == 0 && !state.closed {
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(n)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_replies_follow_writes_in_order() {
        let mut port = MockSerialPort::new("MOCK0");
        port.queue_silence();
        port.queue_reply(b"menu");

        port.write_bytes(b"\r\n").unwrap();
        assert_eq!(port.available_bytes(), 0);

        port.write_bytes(b"\r\n").unwrap();
        assert_eq!(port.available_bytes(), 4);
        assert_eq!(port.pending_replies(), 0);

        // Unscripted writes are logged but produce nothing.
        port.write_bytes(b"*").unwrap();
        assert_eq!(port.available_bytes(), 4);
        assert_eq!(port.get_write_log().len(), 3);
    }

    #[test]
    fn test_shared_state_between_clones() {
        let port = MockSerialPort::new("MOCK0");
        let mut handle = port.clone();
        handle.enqueue_read(b"abc");
        assert_eq!(port.available_bytes(), 3);
    }

    #[test]
    fn test_timeout_simulation() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);

        let mut buffer = [0u8; 10];
        match port.read_bytes(&mut buffer) {
            Err(PortError::Timeout(d)) => assert_eq!(d, Duration::from_millis(50)),
            other => panic!("Expected timeout error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_read_is_idle() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];

        let err = port.read_bytes(&mut buffer).unwrap_err();
        assert!(err.is_idle());
    }

    #[test]
    fn test_closed_port_drains_then_reports_eof() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"bye");
        port.close();

        let mut buffer = [0u8; 2];
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 2);
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 1);
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 0);
        assert!(matches!(port.write_bytes(b"x"), Err(PortError::Closed)));
    }
}
