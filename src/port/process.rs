//! Child-process console for emulated and host-simulation targets.
//!
//! QEMU (`-serial stdio` / `-nographic`) and the `linux` host build both
//! expose the application console on their terminal. The program is spawned
//! on a pseudo-terminal with `rexpect`, and reads go through the session's
//! non-blocking reader so an empty read is reported as idle, the same way a
//! serial port with nothing in its buffer is.
//!
//! The terminal starts in canonical mode with echo off. Programs that read
//! single keys (the Unity menu takes `*` without a newline) switch it to raw
//! mode themselves, as QEMU does for `-serial stdio`.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use rexpect::process::wait::WaitStatus;
use rexpect::session::{spawn_command, PtySession};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

/// How long to wait for the rest of the output once the program has exited.
const DRAIN_TIMEOUT_MS: u64 = 2000;

/// Console backed by a program running on a pseudo-terminal.
pub struct ProcessPort {
    session: PtySession,
    pending: VecDeque<u8>,
    exited: bool,
    name: String,
}

impl ProcessPort {
    /// Spawn `program` with `args` on a fresh pseudo-terminal.
    ///
    /// stdout and stderr share the terminal, as they would in a shell.
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S]) -> Result<Self, PortError> {
        let name = std::iter::once(program)
            .chain(args.iter().map(|a| a.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");

        // A failed exec would otherwise only show up as an early end of
        // output on the terminal.
        if !is_runnable(program) {
            return Err(PortError::Spawn {
                command: name,
                reason: "program not found".to_string(),
            });
        }

        let mut command = Command::new(program);
        command.args(args.iter().map(|a| a.as_ref()));
        let session =
            spawn_command(command, Some(DRAIN_TIMEOUT_MS)).map_err(|e| PortError::Spawn {
                command: name.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(command = %name, "DUT process spawned");

        Ok(Self {
            session,
            pending: VecDeque::new(),
            exited: false,
            name,
        })
    }

    fn still_running(&self) -> bool {
        matches!(self.session.process.status(), Some(WaitStatus::StillAlive))
    }

    /// Collect whatever the program printed before its terminal closed.
    fn drain_after_exit(&mut self) {
        self.exited = true;
        match self.session.exp_eof() {
            Ok(rest) => self.pending.extend(rest.chars().map(narrow)),
            Err(e) => tracing::debug!(command = %self.name, error = %e, "DUT console ended"),
        }
    }
}

/// The session reader widens every received byte to a `char`.
fn narrow(c: char) -> u8 {
    u8::try_from(c).unwrap_or(b'?')
}

fn is_runnable(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

impl SerialPortAdapter for ProcessPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        if self.exited {
            return Err(PortError::Closed);
        }
        let writer = &mut self.session.writer;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        if self.pending.is_empty() && !self.exited {
            while self.pending.len() < buffer.len() {
                match self.session.try_read() {
                    Some(c) => self.pending.push_back(narrow(c)),
                    None => break,
                }
            }
            if self.pending.is_empty() {
                if self.still_running() {
                    return Err(PortError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
                }
                self.drain_after_exit();
            }
        }

        // Empty after exit means end of stream.
        let n = buffer.len().min(self.pending.len());
        for (slot, byte) in buffer.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ProcessPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPort")
            .field("name", &self.name)
            .field("exited", &self.exited)
            .finish()
    }
}
