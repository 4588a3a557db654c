//! Unity test summary handling.
//!
//! Unity ends a run with a line such as `6 Tests 0 Failures 0 Ignored`. This
//! module owns that pattern, turns a match into counts and decides the
//! verdict. Parsing is a pure function of the line.

use crate::dut::{DutError, PatternMatch};
use once_cell::sync::Lazy;
use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Summary line pattern printed by Unity at the end of a run.
pub const SUMMARY_PATTERN: &str = r"(\d+) Tests (\d+) Failures (\d+) Ignored";

/// Compiled [`SUMMARY_PATTERN`].
pub static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| summary_regex(SUMMARY_PATTERN).expect("summary pattern is a valid regex"));

/// Compile a summary pattern over raw console bytes.
///
/// Unicode mode is off: `\d` matches ASCII digits only.
pub fn summary_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

/// Counts reported by a Unity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitySummary {
    pub tests: u64,
    pub failures: u64,
    pub ignored: u64,
}

/// Why a parsed summary does not count as a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    #[error("No tests were executed!")]
    NoTestsExecuted,

    #[error("Unity tests failed with {failures} failures")]
    TestsFailed { failures: u64 },
}

impl UnitySummary {
    /// Build a summary from a match of [`SUMMARY_RE`].
    ///
    /// Counts too large for `u64` saturate, so a huge failure count still
    /// fails the run.
    pub fn from_match(m: &PatternMatch) -> Result<Self, DutError> {
        Ok(Self {
            tests: m.group_count(1)?,
            failures: m.group_count(2)?,
            ignored: m.group_count(3)?,
        })
    }

    /// Pass iff something ran and nothing failed. Ignored tests never gate.
    pub fn verdict(&self) -> Result<(), AssertionFailure> {
        if self.tests == 0 {
            return Err(AssertionFailure::NoTestsExecuted);
        }
        if self.failures != 0 {
            return Err(AssertionFailure::TestsFailed {
                failures: self.failures,
            });
        }
        Ok(())
    }

    pub fn passed(&self) -> bool {
        self.verdict().is_ok()
    }
}

impl fmt::Display for UnitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unity Results: {} Tests, {} Failures, {} Ignored",
            self.tests, self.failures, self.ignored
        )
    }
}
