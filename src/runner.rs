//! Connects to the configured console and runs the menu procedure end to end.

use crate::config::{Config, ConfigError};
use crate::dut::Dut;
use crate::error::{RunError, RunResult};
#[cfg(not(unix))]
use crate::port::PortError;
#[cfg(unix)]
use crate::port::ProcessPort;
use crate::port::{PortConfiguration, SerialPortAdapter, SyncSerialPort};
use crate::procedure::MenuProcedure;
use crate::target::Transport;
use crate::unity::UnitySummary;
use std::io::Write;
use tracing::{error, info};

/// Console type the binary works with.
pub type BoxedConsole = Box<dyn SerialPortAdapter>;

/// Result of a run: whatever summary was parsed plus the final verdict.
#[derive(Debug)]
pub struct Outcome {
    pub summary: Option<UnitySummary>,
    pub result: RunResult<()>,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Open the console the selected target uses.
pub fn connect(config: &Config) -> RunResult<BoxedConsole> {
    match config.dut.target.transport() {
        Transport::Serial => {
            let port = config
                .serial
                .port
                .as_deref()
                .map(|p| config.serial.resolve_port(p))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!(
                        "serial.port (target {} uses a serial console)",
                        config.dut.target
                    ))
                })?;
            let line = PortConfiguration {
                baud_rate: config.serial.baud,
                timeout: config.serial.read_timeout(),
                ..PortConfiguration::default()
            };
            Ok(Box::new(SyncSerialPort::open(&port, line)?))
        }
        Transport::Process => {
            let command = config.process.command.as_deref().ok_or_else(|| {
                ConfigError::MissingRequired(format!(
                    "process.command (target {} runs as a process)",
                    config.dut.target
                ))
            })?;
            spawn_console(command, &config.process.args)
        }
    }
}

#[cfg(unix)]
fn spawn_console(command: &str, args: &[String]) -> RunResult<BoxedConsole> {
    Ok(Box::new(ProcessPort::spawn(command, args)?))
}

#[cfg(not(unix))]
fn spawn_console(command: &str, _args: &[String]) -> RunResult<BoxedConsole> {
    Err(PortError::config(format!(
        "cannot run '{command}': process consoles need a pseudo-terminal (unix hosts only)"
    ))
    .into())
}

/// Wrap a console in a driver configured from `config`.
///
/// An unwritable transcript path is a setup problem, reported before the
/// device is touched.
pub fn attach<P: SerialPortAdapter>(port: P, config: &Config) -> RunResult<Dut<P>> {
    let dut = Dut::new(port).with_poll_interval(config.dut.poll_interval());
    match &config.dut.transcript {
        Some(path) => dut.with_transcript_file(path).map_err(|e| {
            RunError::from(ConfigError::validation(
                "dut.transcript",
                format!("cannot create {}: {e}", path.display()),
            ))
        }),
        None => Ok(dut),
    }
}

/// Run the procedure, print the summary line to `out`, then judge it.
///
/// The summary line is written before the verdict so it is visible on
/// failing runs too.
pub fn execute<P: SerialPortAdapter, W: Write>(
    dut: &mut Dut<P>,
    procedure: &MenuProcedure,
    out: &mut W,
) -> Outcome {
    let summary = match procedure.run(dut) {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "procedure aborted");
            return Outcome {
                summary: None,
                result: Err(e.into()),
            };
        }
    };

    if let Err(e) = writeln!(out, "{summary}") {
        return Outcome {
            summary: Some(summary),
            result: Err(e.into()),
        };
    }
    info!(
        tests = summary.tests,
        failures = summary.failures,
        ignored = summary.ignored,
        "unity summary"
    );

    Outcome {
        summary: Some(summary),
        result: summary.verdict().map_err(RunError::from),
    }
}
