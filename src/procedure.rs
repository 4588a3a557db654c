//! The Unity menu procedure.
//!
//! Boot, open the menu, run every test, read the summary:
//!
//! ```text
//! expect "Calling app_main()"
//! expect "Press ENTER to see the list of tests."
//! repeat up to N times:  write "\r\n", pause, expect menu banner
//! if never seen:         write "\n", expect "Enter test name or number"
//! write "*"
//! expect /(\d+) Tests (\d+) Failures (\d+) Ignored/
//! ```
//!
//! The banner wait inside the retry loop is the only place a driver failure
//! is recovered from; emulated UARTs sometimes drop the first newlines.
//! Writes are never retried.

use crate::config::{Config, ProcedureConfig, ProtocolConfig};
use crate::dut::{Dut, DutError};
use crate::port::SerialPortAdapter;
use crate::target::Target;
use crate::unity::{self, UnitySummary};
use regex::bytes::Regex;
use std::thread;
use tracing::{debug, info, warn};

/// Targets this procedure is tagged for.
pub const SUPPORTED_TARGETS: [Target; 5] = Target::ALL;

/// How the menu was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The banner appeared after the given 1-based attempt.
    Opened { attempt: u32 },
    /// Every attempt failed and the fallback prompt appeared.
    Fallback,
}

/// Everything the procedure needs besides the device.
#[derive(Debug, Clone)]
pub struct MenuProcedure {
    pub timing: ProcedureConfig,
    pub protocol: ProtocolConfig,
    summary_re: Regex,
}

impl MenuProcedure {
    pub fn new(timing: ProcedureConfig, protocol: ProtocolConfig) -> Result<Self, DutError> {
        let summary_re = unity::summary_regex(&protocol.summary_pattern)?;
        Ok(Self {
            timing,
            protocol,
            summary_re,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DutError> {
        Self::new(config.procedure.clone(), config.protocol.clone())
    }

    pub fn supports(target: Target) -> bool {
        SUPPORTED_TARGETS.contains(&target)
    }

    /// Run steps 1 through 6 and return the parsed summary.
    ///
    /// The verdict is left to the caller so the summary can be reported
    /// whatever it says.
    pub fn run<P: SerialPortAdapter>(&self, dut: &mut Dut<P>) -> Result<UnitySummary, DutError> {
        self.await_boot(dut)?;
        let outcome = self.open_menu(dut)?;
        debug!(?outcome, "menu reached");
        self.run_all(dut)
    }

    /// Steps 1 and 2: wait for the application and for the menu prompt.
    pub fn await_boot<P: SerialPortAdapter>(&self, dut: &mut Dut<P>) -> Result<(), DutError> {
        info!(console = dut.name(), "waiting for application start");
        dut.expect_exact(&self.protocol.boot_marker, self.timing.boot_timeout())?;

        info!("waiting for menu prompt");
        dut.expect_exact(&self.protocol.menu_prompt, self.timing.menu_prompt_timeout())
    }

    /// Steps 3 and 4: bounded retries, then one last-resort attempt whose
    /// failure propagates.
    ///
    /// Only the banner wait of an attempt is recovered from; a trigger that
    /// cannot be written ends the run.
    pub fn open_menu<P: SerialPortAdapter>(
        &self,
        dut: &mut Dut<P>,
    ) -> Result<MenuOutcome, DutError> {
        for attempt in 1..=self.timing.menu_attempts {
            dut.write(&self.protocol.menu_trigger)?;
            match self.await_menu(dut) {
                Ok(()) => {
                    info!(attempt, "test menu displayed");
                    return Ok(MenuOutcome::Opened { attempt });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "menu did not appear, retrying");
                }
            }
        }

        warn!(
            attempts = self.timing.menu_attempts,
            "menu trigger exhausted, trying fallback prompt"
        );
        dut.write(&self.protocol.fallback_trigger)?;
        dut.expect_exact(&self.protocol.fallback_prompt, self.timing.fallback_timeout())?;
        Ok(MenuOutcome::Fallback)
    }

    fn await_menu<P: SerialPortAdapter>(&self, dut: &mut Dut<P>) -> Result<(), DutError> {
        thread::sleep(self.timing.menu_retry_delay());
        dut.expect_exact(&self.protocol.menu_banner, self.timing.menu_timeout())
    }

    /// Steps 5 and 6: select every test and parse the summary line.
    pub fn run_all<P: SerialPortAdapter>(
        &self,
        dut: &mut Dut<P>,
    ) -> Result<UnitySummary, DutError> {
        info!("running all tests");
        dut.write(&self.protocol.run_all)?;

        let found = dut.expect(&self.summary_re, self.timing.summary_timeout())?;
        let summary = UnitySummary::from_match(&found)?;
        debug!(line = %found.text, "summary line");
        Ok(summary)
    }
}

impl Default for MenuProcedure {
    fn default() -> Self {
        let protocol = ProtocolConfig::default();
        Self {
            timing: ProcedureConfig::default(),
            summary_re: unity::SUMMARY_RE.clone(),
            protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockSerialPort, PortError};
    use std::time::Duration;

    fn fast() -> MenuProcedure {
        MenuProcedure::new(
            ProcedureConfig {
                boot_timeout_ms: 50,
                menu_prompt_timeout_ms: 50,
                menu_attempts: 5,
                menu_retry_delay_ms: 1,
                menu_timeout_ms: 20,
                fallback_timeout_ms: 30,
                summary_timeout_ms: 50,
            },
            ProtocolConfig::default(),
        )
        .unwrap()
    }

    fn dut(port: &MockSerialPort) -> Dut<MockSerialPort> {
        Dut::new(port.clone()).with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_menu_on_first_attempt() {
        let mut port = MockSerialPort::new("MOCK0");
        port.queue_reply(b"\nHere's the test menu, pick your combo:\n(1)\t\"basic\"\n");

        let outcome = fast().open_menu(&mut dut(&port)).unwrap();
        assert_eq!(outcome, MenuOutcome::Opened { attempt: 1 });
        assert_eq!(port.get_write_log(), vec![b"\r\n".to_vec()]);
    }

    #[test]
    fn test_zero_attempts_goes_straight_to_fallback() {
        let mut port = MockSerialPort::new("MOCK0");
        port.queue_reply(b"Enter test name or number: ");

        let mut procedure = fast();
        procedure.timing.menu_attempts = 0;

        let outcome = procedure.open_menu(&mut dut(&port)).unwrap();
        assert_eq!(outcome, MenuOutcome::Fallback);
        assert_eq!(port.get_write_log(), vec![b"\n".to_vec()]);
    }

    #[test]
    fn test_failed_trigger_write_is_fatal() {
        let mut port = MockSerialPort::new("MOCK0");
        port.queue_reply(b"Here's the test menu, pick your combo:\n");
        port.set_should_timeout(true);

        let err = fast().open_menu(&mut dut(&port)).unwrap_err();
        assert!(matches!(err, DutError::Port(PortError::Timeout(_))));
        // No second trigger and no fallback after the failed write.
        assert!(port.get_write_log().is_empty());
        assert_eq!(port.pending_replies(), 1);
    }

    #[test]
    fn test_boot_timeout_is_fatal() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"ets Jun  8 2016 00:22:57\nrst:0x1\n");

        let err = fast().run(&mut dut(&port)).unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("Calling app_main()"));
        assert!(port.get_write_log().is_empty());
    }

    #[test]
    fn test_custom_summary_pattern() {
        let mut protocol = ProtocolConfig::default();
        protocol.summary_pattern = r"Ran (\d+), failed (\d+), skipped (\d+)".to_string();
        let procedure = MenuProcedure::new(fast().timing, protocol).unwrap();

        let mut port = MockSerialPort::new("MOCK0");
        port.queue_reply(b"Ran 4, failed 0, skipped 1\n");
        let summary = procedure.run_all(&mut dut(&port)).unwrap();
        assert_eq!(summary.tests, 4);
        assert_eq!(summary.ignored, 1);
    }

    #[test]
    fn test_all_targets_supported() {
        for target in Target::ALL {
            assert!(MenuProcedure::supports(target));
        }
    }
}
