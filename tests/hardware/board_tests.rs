//! Full procedure against a real board.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export UNITY_HIL_TEST_PORT=/dev/ttyUSB0   # or COM3 on Windows
//! export UNITY_HIL_TEST_BAUD=115200         # optional
//!
//! # Reset the board right after starting the tests
//! cargo test --features hardware-tests -- --ignored
//! ```

use super::utils::{board_or_skip, print_available_ports};
use unity_hil::runner::execute;
use unity_hil::MenuProcedure;

#[test]
#[ignore]
fn test_board_port_opens() {
    let Some(board) = board_or_skip() else {
        print_available_ports();
        return;
    };

    let dut = board.open();
    assert_eq!(dut.name(), board.port_name);
}

#[test]
#[ignore]
fn test_board_runs_all_tests() {
    let Some(board) = board_or_skip() else {
        return;
    };

    let mut dut = board.open();
    let mut out = Vec::new();
    let outcome = execute(&mut dut, &MenuProcedure::default(), &mut out);

    println!("{}", String::from_utf8_lossy(&out));
    let summary = outcome.summary.expect("board printed a Unity summary");
    assert!(summary.tests > 0);
    assert!(outcome.passed(), "{:?}", outcome.result);
}
