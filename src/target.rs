//! Target selection labels.
//!
//! A target names the environment the DUT runs in. Hardware boards are
//! reached over a serial port; the emulator and the host build are spawned
//! as processes whose stdio is the console.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Esp32,
    Esp32s3,
    Esp32c3,
    Qemu,
    Linux,
}

/// How the console of a target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Serial,
    Process,
}

impl Target {
    pub const ALL: [Target; 5] = [
        Target::Esp32,
        Target::Esp32s3,
        Target::Esp32c3,
        Target::Qemu,
        Target::Linux,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esp32 => "esp32",
            Self::Esp32s3 => "esp32s3",
            Self::Esp32c3 => "esp32c3",
            Self::Qemu => "qemu",
            Self::Linux => "linux",
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Self::Esp32 | Self::Esp32s3 | Self::Esp32c3 => Transport::Serial,
            Self::Qemu | Self::Linux => Transport::Process,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::Esp32
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown target '{s}'"))
    }
}
