//! Serial link to the reporting microcontroller.
//!
//! The microcontroller speaks a line-oriented text protocol: one message per
//! `\n`-terminated line. `SerialLink` polls the port without blocking the
//! watch loop and hands back one trimmed line at a time.

use crate::common::{Result, SerialConfig, SentryError};
use serialport::{SerialPort, SerialPortInfo};
use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

/// A source of line-delimited text messages.
///
/// `poll_line` must not block beyond the configured read timeout and returns
/// `Ok(None)` when no complete line is pending.
pub trait LineSource {
    fn poll_line(&mut self) -> Result<Option<String>>;
}

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialLink {
    pub fn open(config: &SerialConfig) -> Result<Self> {
        tracing::info!(
            "Opening serial port {} at {} baud",
            config.port,
            config.baud_rate
        );
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| {
                SentryError::Serial(format!("Failed to open {}: {}", config.port, e))
            })?;

        // Give the link time to establish before polling.
        std::thread::sleep(Duration::from_millis(config.settle_delay_ms));

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl LineSource for SerialLink {
    fn poll_line(&mut self) -> Result<Option<String>> {
        // A previous read may have buffered more than one line.
        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }

        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; available.min(4096)];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                Ok(take_line(&mut self.pending))
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(SentryError::Io(e)),
        }
    }
}

/// Pop the first complete line off the buffer, decoded best-effort and
/// trimmed of surrounding whitespace (handles CRLF terminators).
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let raw: Vec<u8> = pending.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&raw).trim().to_string())
}

/// Scripted line source for tests and dry runs: yields a fixed sequence of
/// lines, then `None` forever.
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedLines {
    fn poll_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
