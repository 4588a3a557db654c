//! Property tests for reading the Unity summary off a console and for the
//! verdict rule.

mod common;

use common::{dut_for, fast_procedure};
use proptest::prelude::*;
use unity_hil::{AssertionFailure, MockSerialPort, UnitySummary};

/// Answer the `*` selection with `output` and read the summary back.
fn summary_after_run_all(output: &str) -> UnitySummary {
    let mut port = MockSerialPort::new("MOCK-DUT");
    port.queue_reply(output.as_bytes());
    fast_procedure()
        .run_all(&mut dut_for(&port))
        .expect("summary line present")
}

proptest! {
    #[test]
    fn run_all_recovers_counts(
        tests in any::<u64>(),
        failures in any::<u64>(),
        ignored in any::<u64>(),
        prefix in "[a-zA-Z:. \r\n-]{0,40}",
        suffix in "[ \r\n]{0,4}(OK|FAIL)?",
    ) {
        let output = format!("{prefix}\n{tests} Tests {failures} Failures {ignored} Ignored{suffix}");
        prop_assert_eq!(
            summary_after_run_all(&output),
            UnitySummary { tests, failures, ignored }
        );
    }

    #[test]
    fn verdict_matches_rule(tests in any::<u64>(), failures in any::<u64>(), ignored in any::<u64>()) {
        let summary = UnitySummary { tests, failures, ignored };
        let expected = if tests == 0 {
            Err(AssertionFailure::NoTestsExecuted)
        } else if failures != 0 {
            Err(AssertionFailure::TestsFailed { failures })
        } else {
            Ok(())
        };
        prop_assert_eq!(summary.verdict(), expected);
        // Same input, same verdict.
        prop_assert_eq!(summary.verdict(), summary.verdict());
    }

    #[test]
    fn counts_past_u64_saturate(huge in "[1-9][0-9]{20,30}", failures in 0u64..10) {
        let output = format!("{huge} Tests {failures} Failures 0 Ignored\r\n");
        let summary = summary_after_run_all(&output);
        prop_assert_eq!(summary.tests, u64::MAX);
        prop_assert_eq!(summary.failures, failures);
    }
}
