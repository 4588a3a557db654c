//! Machine-readable record of one run, printed with `--json`.

use crate::error::RunError;
use crate::target::Target;
use crate::unity::UnitySummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub target: Target,
    /// Serial port path or command line of the console
    pub console: String,
    pub verdict: Verdict,
    pub summary: Option<UnitySummary>,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(target: Target, console: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            target,
            console: console.into(),
            verdict: Verdict::Skipped,
            summary: None,
            message: None,
            started_at,
            duration_ms: 0,
        }
    }

    /// Fill in the outcome. `summary` is whatever was parsed, even when the
    /// verdict failed.
    pub fn finish(
        mut self,
        summary: Option<UnitySummary>,
        result: &Result<(), RunError>,
        elapsed: Duration,
    ) -> Self {
        self.summary = summary;
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(()) => self.verdict = Verdict::Passed,
            Err(e @ RunError::Assertion(_)) => {
                self.verdict = Verdict::Failed;
                self.message = Some(e.to_string());
            }
            Err(e) => {
                self.verdict = Verdict::Error;
                self.message = Some(e.to_string());
            }
        }
        self
    }

    /// Mark the run as not applicable to the selected target.
    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.verdict = Verdict::Skipped;
        self.message = Some(reason.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::AssertionFailure;

    fn summary() -> UnitySummary {
        UnitySummary {
            tests: 6,
            failures: 1,
            ignored: 0,
        }
    }

    #[test]
    fn test_failed_report_keeps_summary() {
        let result = Err(RunError::from(AssertionFailure::TestsFailed { failures: 1 }));
        let report = RunReport::new(Target::Esp32, "/dev/ttyUSB0", Utc::now()).finish(
            Some(summary()),
            &result,
            Duration::from_millis(1500),
        );

        assert_eq!(report.verdict, Verdict::Failed);
        assert_eq!(report.summary, Some(summary()));
        assert_eq!(report.duration_ms, 1500);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["verdict"], "failed");
        assert_eq!(json["target"], "esp32");
        assert_eq!(json["summary"]["failures"], 1);
        assert_eq!(json["message"], "Unity tests failed with 1 failures");
    }

    #[test]
    fn test_skipped_report() {
        let report = RunReport::new(Target::Linux, "./app.elf", Utc::now()).skipped("not tagged");
        assert_eq!(report.verdict, Verdict::Skipped);
        assert!(report.summary.is_none());
    }
}
