//! Console driver for the device under test.
//!
//! [`Dut`] sits on any [`SerialPortAdapter`] and offers the three primitives
//! the test procedure is written against: `write`, `expect_exact` and
//! `expect`. Incoming bytes accumulate in a buffer; a successful expectation
//! consumes the buffer through the end of the match, anything after it stays
//! for the next call.

use crate::port::{PortError, SerialPortAdapter};
use memchr::memmem;
use regex::bytes::Regex;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// How much unmatched output a timeout error carries for diagnostics.
const TAIL_BYTES: usize = 256;

const READ_CHUNK: usize = 1024;

/// Errors raised by the console driver.
#[derive(Debug, Error)]
pub enum DutError {
    /// The pattern did not show up before the deadline.
    #[error("Timed out after {timeout:?} waiting for {pattern}; last output: {tail:?}")]
    Timeout {
        pattern: String,
        timeout: Duration,
        tail: String,
    },

    /// The console ended while waiting for a pattern.
    #[error("Console closed while waiting for {pattern}")]
    Closed { pattern: String },

    /// Transport failure.
    #[error(transparent)]
    Port(#[from] PortError),

    /// A regular expression failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A capture group did not hold what the caller needed.
    #[error("Capture group {group} is not a count: {value:?}")]
    BadCapture { group: usize, value: String },

    /// Transcript file could not be written.
    #[error("Transcript error: {0}")]
    Transcript(std::io::Error),
}

impl DutError {
    /// True for the "pattern never appeared" family of failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// What to look for in the console output.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A literal byte sequence.
    Exact(String),
    /// A regular expression over the raw bytes.
    Regex(Regex),
}

impl Pattern {
    /// Compile a regex pattern.
    pub fn regex(source: &str) -> Result<Self, DutError> {
        Ok(Self::Regex(Regex::new(source)?))
    }

    /// Locate the pattern in `haystack`, returning the match span and its
    /// capture groups.
    fn find(&self, haystack: &[u8]) -> Option<(usize, usize, Vec<Option<String>>)> {
        match self {
            Self::Exact(literal) => memmem::find(haystack, literal.as_bytes())
                .map(|start| (start, start + literal.len(), Vec::new())),
            Self::Regex(re) => re.captures(haystack).map(|caps| {
                let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
                let groups = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned()))
                    .collect();
                (whole.0, whole.1, groups)
            }),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(literal) => write!(f, "{literal:?}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(literal: &str) -> Self {
        Self::Exact(literal.to_string())
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// A successful expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// The text that matched.
    pub text: String,
    /// Capture groups 1..=n; `None` for groups that did not participate.
    pub groups: Vec<Option<String>>,
}

impl PatternMatch {
    /// Capture group by 1-based index, as regex engines number them.
    pub fn group(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.as_deref())
    }

    /// Parse a capture group of ASCII digits as a count. Values past
    /// `u64::MAX` saturate.
    pub fn group_count(&self, index: usize) -> Result<u64, DutError> {
        let value = self.group(index).unwrap_or_default();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DutError::BadCapture {
                group: index,
                value: value.to_string(),
            });
        }
        Ok(value.bytes().fold(0u64, |n, b| {
            n.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        }))
    }
}

/// Device session driver.
#[derive(Debug)]
pub struct Dut<P> {
    port: P,
    buffer: Vec<u8>,
    transcript: Vec<u8>,
    transcript_file: Option<File>,
    poll_interval: Duration,
    closed: bool,
}

impl<P: SerialPortAdapter> Dut<P> {
    /// Attach to an already connected console.
    pub fn new(port: P) -> Self {
        Self {
            port,
            buffer: Vec::new(),
            transcript: Vec::new(),
            transcript_file: None,
            poll_interval: Duration::from_millis(10),
            closed: false,
        }
    }

    /// Back-off between reads that returned nothing.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Mirror every received byte into `path`.
    pub fn with_transcript_file(mut self, path: impl AsRef<Path>) -> Result<Self, DutError> {
        let file = File::create(path.as_ref()).map_err(DutError::Transcript)?;
        self.transcript_file = Some(file);
        Ok(self)
    }

    /// Name of the underlying console.
    pub fn name(&self) -> &str {
        self.port.name()
    }

    /// Everything received so far.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// Unconsumed output.
    pub fn pending_output(&self) -> &[u8] {
        &self.buffer
    }

    /// Write bytes (or a string) to the device.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<(), DutError> {
        let data = data.as_ref();
        debug!(data = ?String::from_utf8_lossy(data), "dut write");
        self.port.write_all_bytes(data)?;
        Ok(())
    }

    /// Wait until `literal` appears in the output.
    pub fn expect_exact(&mut self, literal: &str, timeout: Duration) -> Result<(), DutError> {
        self.expect_pattern(&Pattern::Exact(literal.to_string()), timeout)
            .map(|_| ())
    }

    /// Wait until `re` matches the output and return the match.
    pub fn expect(&mut self, re: &Regex, timeout: Duration) -> Result<PatternMatch, DutError> {
        self.expect_pattern(&Pattern::Regex(re.clone()), timeout)
    }

    /// Wait for any [`Pattern`].
    pub fn expect_pattern(
        &mut self,
        pattern: &Pattern,
        timeout: Duration,
    ) -> Result<PatternMatch, DutError> {
        let deadline = Instant::now() + timeout;
        debug!(%pattern, ?timeout, "dut expect");

        loop {
            if let Some(found) = self.take_match(pattern) {
                return Ok(found);
            }
            if self.closed {
                return Err(DutError::Closed {
                    pattern: pattern.to_string(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DutError::Timeout {
                    pattern: pattern.to_string(),
                    timeout,
                    tail: self.tail(),
                });
            }

            if !self.fill()? {
                let nap = self.poll_interval.min(deadline - now);
                thread::sleep(nap);
            }
        }
    }

    fn take_match(&mut self, pattern: &Pattern) -> Option<PatternMatch> {
        let (start, end, groups) = pattern.find(&self.buffer)?;
        let text = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
        self.buffer.drain(..end);
        Some(PatternMatch { text, groups })
    }

    /// Pull whatever the console has. Returns false when nothing arrived.
    fn fill(&mut self) -> Result<bool, DutError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.port.read_bytes(&mut chunk) {
            Ok(0) => {
                self.closed = true;
                Ok(false)
            }
            Ok(n) => {
                let data = &chunk[..n];
                trace!(data = ?String::from_utf8_lossy(data), "dut read");
                self.buffer.extend_from_slice(data);
                self.transcript.extend_from_slice(data);
                if let Some(file) = self.transcript_file.as_mut() {
                    file.write_all(data).map_err(DutError::Transcript)?;
                }
                Ok(true)
            }
            Err(e) if e.is_idle() => Ok(false),
            Err(PortError::Closed) => {
                self.closed = true;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn tail(&self) -> String {
        let start = self.buffer.len().saturating_sub(TAIL_BYTES);
        String::from_utf8_lossy(&self.buffer[start..]).into_owned()
    }
}
