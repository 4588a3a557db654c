//! Shared test utilities for the Unity HIL runner tests.
//!
//! This module provides:
//! - Canned device output (boot log, menu, summary lines)
//! - A builder that scripts a whole device session on a mock console
//! - Fast procedure timings so failure paths finish in milliseconds

#![allow(dead_code)]

use std::time::Duration;
use unity_hil::config::{ProcedureConfig, ProtocolConfig};
use unity_hil::{Dut, MenuProcedure, MockSerialPort};

pub const BOOT_LOG: &[u8] = b"ESP-ROM:esp32c3-api1-20210207\r\n\
I (312) cpu_start: Pro cpu start user code\r\n\
I (330) main_task: Started on CPU0\r\n\
I (340) main_task: Calling app_main()\r\n";

pub const MENU_PROMPT: &[u8] = b"\r\nPress ENTER to see the list of tests.\r\n";

pub const MENU: &[u8] = b"\r\n\r\nHere's the test menu, pick your combo:\r\n\
(1)\t\"GpioValidator: Basic valid GPIOs\" [gpio_validator][basic]\r\n\
(2)\t\"GpioValidator: Flash pins rejection\" [gpio_validator][critical]\r\n\
\r\nEnter test for running.\r\n";

pub const FALLBACK_PROMPT: &[u8] = b"\r\nEnter test name or number: ";

/// Unity run output ending in the given summary line.
pub fn unity_run(tests: u64, failures: u64, ignored: u64) -> Vec<u8> {
    format!(
        "Running GpioValidator: Basic valid GPIOs...\r\n\
         MALLOC_CAP_8BIT: Before 301864 bytes free, After 301864 bytes free (delta 0)\r\n\
         PASS\r\n\
         \r\n-----------------------\r\n\
         {tests} Tests {failures} Failures {ignored} Ignored \r\n\
         {}\r\n",
        if failures == 0 { "OK" } else { "FAIL" }
    )
    .into_bytes()
}

/// Procedure timings scaled down to milliseconds.
pub fn fast_timing() -> ProcedureConfig {
    ProcedureConfig {
        boot_timeout_ms: 200,
        menu_prompt_timeout_ms: 200,
        menu_attempts: 5,
        menu_retry_delay_ms: 2,
        menu_timeout_ms: 25,
        fallback_timeout_ms: 50,
        summary_timeout_ms: 200,
    }
}

pub fn fast_procedure() -> MenuProcedure {
    MenuProcedure::new(fast_timing(), ProtocolConfig::default())
        .expect("default protocol compiles")
}

/// Scripts a device session on a [`MockSerialPort`].
///
/// # Example
/// ```ignore
/// let device = DeviceScript::booted().menu_after(3).runs(6, 0, 0).build();
/// ```
pub struct DeviceScript {
    port: MockSerialPort,
}

impl DeviceScript {
    /// A device with nothing printed yet.
    pub fn silent() -> Self {
        Self {
            port: MockSerialPort::new("MOCK-DUT"),
        }
    }

    /// A device that has booted and printed the menu prompt.
    pub fn booted() -> Self {
        let mut script = Self::silent();
        script.port.enqueue_read(BOOT_LOG);
        script.port.enqueue_read(MENU_PROMPT);
        script
    }

    /// Ignore the trigger writes before `attempt`, then print the menu.
    pub fn menu_after(mut self, attempt: u32) -> Self {
        for _ in 1..attempt {
            self.port.queue_silence();
        }
        self.port.queue_reply(MENU);
        self
    }

    /// Ignore every retry, then answer the fallback newline with the
    /// alternate prompt.
    pub fn fallback_answers(mut self, attempts: u32) -> Self {
        for _ in 0..attempts {
            self.port.queue_silence();
        }
        self.port.queue_reply(FALLBACK_PROMPT);
        self
    }

    /// Ignore every write including the fallback.
    pub fn never_answers(mut self, writes: u32) -> Self {
        for _ in 0..writes {
            self.port.queue_silence();
        }
        self
    }

    /// Answer the `*` selection with a Unity run.
    pub fn runs(mut self, tests: u64, failures: u64, ignored: u64) -> Self {
        self.port.queue_reply(&unity_run(tests, failures, ignored));
        self
    }

    pub fn build(self) -> MockSerialPort {
        self.port
    }
}

/// Driver over a clone of `port`, polling fast.
pub fn dut_for(port: &MockSerialPort) -> Dut<MockSerialPort> {
    Dut::new(port.clone()).with_poll_interval(Duration::from_millis(1))
}

/// Writes seen by the device, as strings.
pub fn writes(port: &MockSerialPort) -> Vec<String> {
    port.get_write_log()
        .into_iter()
        .map(|w| String::from_utf8_lossy(&w).into_owned())
        .collect()
}
