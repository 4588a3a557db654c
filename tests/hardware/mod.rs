//! Hardware-specific tests requiring a board flashed with a Unity test app.
//!
//! These tests are ignored by default and require actual hardware to run.
//! They should be run manually with the `--ignored` flag and appropriate
//! environment variables set.

pub mod board_tests;
pub mod utils;
