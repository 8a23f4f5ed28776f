//! Request/reply exchange over a byte transport.

use super::{LaserCommand, LaserError};
use crate::config::LaserConfig;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

/// One command and the controller's reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Command sent.
    pub command: LaserCommand,
    /// Trimmed reply line; empty when the controller stayed silent.
    pub reply: String,
}

/// The bring-up sequence run before a sweep: unlock, enable emission,
/// set the diode current, then read back the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerUp {
    /// Level unlocked first.
    pub access_level: u8,
    /// Unlock code for `access_level`.
    pub access_code: u32,
    /// Diode current set after emission is enabled.
    pub current_ma: u32,
}

impl PowerUp {
    /// Reads the plan from config; the unlock code must be set.
    pub fn from_config(config: &LaserConfig) -> Result<Self, LaserError> {
        let access_code = config
            .access_code
            .ok_or(LaserError::MissingAccessCode(config.access_level))?;
        Ok(Self {
            access_level: config.access_level,
            access_code,
            current_ma: config.current_ma,
        })
    }

    /// Commands in the order they are sent.
    pub fn commands(&self) -> [LaserCommand; 4] {
        [
            LaserCommand::Unlock {
                level: self.access_level,
                code: self.access_code,
            },
            LaserCommand::Emission(true),
            LaserCommand::SetCurrent {
                milliamps: self.current_ma,
            },
            LaserCommand::ReadStatus,
        ]
    }
}

/// Line-oriented link to the laser controller.
///
/// Any `Read + Write` transport works; a serial port in production and an
/// in-memory script in tests.
pub struct LaserLink<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Read + Write> LaserLink<T> {
    /// Wraps an open transport; `timeout` bounds each reply.
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Sends `command` and returns the trimmed reply line.
    ///
    /// A reply ends at a newline, at end of stream, or when the timeout
    /// elapses. An empty reply is returned as an empty string.
    pub fn send(&mut self, command: &LaserCommand) -> Result<String, LaserError> {
        trace!(command = %command, "Sending laser command");
        self.transport
            .write_all(command.encode().as_bytes())
            .and_then(|()| self.transport.flush())
            .map_err(|source| LaserError::Io {
                command: *command,
                source,
            })?;

        let reply = self.read_line(command)?;
        trace!(command = %command, reply = %reply, "Laser reply");
        Ok(reply)
    }

    /// Runs the bring-up sequence, stopping at the first transport error.
    pub fn power_up(&mut self, plan: &PowerUp) -> Result<Vec<Exchange>, LaserError> {
        let mut exchanges = Vec::with_capacity(4);
        for command in plan.commands() {
            let reply = self.send(&command)?;
            if reply.is_empty() {
                warn!(command = %command, "No reply from laser controller");
            } else {
                info!(command = %command, reply = %reply, "Laser controller replied");
            }
            exchanges.push(Exchange { command, reply });
        }
        Ok(exchanges)
    }

    /// Returns the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn read_line(&mut self, command: &LaserCommand) -> Result<String, LaserError> {
        let deadline = Instant::now() + self.timeout;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        while Instant::now() < deadline {
            match self.transport.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                    break
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LaserError::Io {
                        command: *command,
                        source,
                    })
                }
            }
        }

        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Replays canned controller output and records what was sent.
    struct ScriptedPort {
        replies: Cursor<Vec<u8>>,
        sent: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(replies: &str) -> Self {
            Self {
                replies: Cursor::new(replies.as_bytes().to_vec()),
                sent: Vec::new(),
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.replies.read(buf)
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Serial-port behaviour: once the canned bytes run out, reads fail
    /// with `error_kind` instead of reporting end of stream.
    struct StallingPort {
        inner: ScriptedPort,
        error_kind: ErrorKind,
        stalled_reads: usize,
    }

    impl StallingPort {
        fn new(replies: &str, error_kind: ErrorKind) -> Self {
            Self {
                inner: ScriptedPort::new(replies),
                error_kind,
                stalled_reads: 0,
            }
        }
    }

    impl Read for StallingPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.inner.read(buf)? {
                0 => {
                    self.stalled_reads += 1;
                    Err(std::io::Error::new(self.error_kind, "no data"))
                }
                n => Ok(n),
            }
        }
    }

    impl Write for StallingPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    fn plan() -> PowerUp {
        PowerUp {
            access_level: 3,
            access_code: 4242,
            current_ma: 79,
        }
    }

    #[test]
    fn test_power_up_sequence() {
        let port = ScriptedPort::new("OK\r\nON\r\n79\r\nI=79.0mA T=25.1C\r\n");
        let mut link = LaserLink::new(port, Duration::from_secs(1));

        let exchanges = link.power_up(&plan()).unwrap();
        let replies: Vec<_> = exchanges.iter().map(|e| e.reply.as_str()).collect();
        assert_eq!(replies, vec!["OK", "ON", "79", "I=79.0mA T=25.1C"]);

        let sent = link.into_inner().sent;
        assert_eq!(
            String::from_utf8(sent).unwrap(),
            "c u 3 4242\re 1\rc 3 79\rr r\r"
        );
    }

    #[test]
    fn test_silent_controller_yields_empty_replies() {
        let mut link = LaserLink::new(ScriptedPort::new(""), Duration::from_millis(50));
        let exchanges = link.power_up(&plan()).unwrap();
        assert_eq!(exchanges.len(), 4);
        assert!(exchanges.iter().all(|e| e.reply.is_empty()));
    }

    #[test]
    fn test_read_timeout_ends_reply_without_error() {
        let port = StallingPort::new("OK\r\n", ErrorKind::TimedOut);
        let mut link = LaserLink::new(port, Duration::from_secs(5));

        let exchanges = link.power_up(&plan()).unwrap();
        let replies: Vec<_> = exchanges.iter().map(|e| e.reply.as_str()).collect();
        assert_eq!(replies, vec!["OK", "", "", ""]);

        let port = link.into_inner();
        assert_eq!(port.stalled_reads, 3);
        assert_eq!(
            String::from_utf8(port.inner.sent).unwrap(),
            "c u 3 4242\re 1\rc 3 79\rr r\r"
        );
    }

    #[test]
    fn test_transport_failure_names_command() {
        let port = StallingPort::new("", ErrorKind::BrokenPipe);
        let mut link = LaserLink::new(port, Duration::from_secs(1));

        let err = link.send(&LaserCommand::ReadStatus).unwrap_err();
        match err {
            LaserError::Io { command, source } => {
                assert_eq!(command, LaserCommand::ReadStatus);
                assert_eq!(source.kind(), ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_power_up_requires_access_code() {
        let config = LaserConfig::default();
        assert!(matches!(
            PowerUp::from_config(&config),
            Err(LaserError::MissingAccessCode(3))
        ));

        let config = LaserConfig {
            access_code: Some(4242),
            ..LaserConfig::default()
        };
        assert_eq!(PowerUp::from_config(&config).unwrap(), plan());
    }
}
