//! Diode laser controller over a serial line.
//!
//! The controller speaks a short ASCII protocol: each command is a line
//! terminated by `\r` and answered with one reply line. Changing the drive
//! current requires unlocking a protected access level first.

mod command;
mod link;
#[cfg(feature = "serial")]
mod serial;

pub use command::LaserCommand;
pub use link::{Exchange, LaserLink, PowerUp};
#[cfg(feature = "serial")]
pub use serial::open_serial;

use thiserror::Error;

/// Errors talking to the laser controller.
#[derive(Debug, Error)]
pub enum LaserError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {port}: {reason}")]
    Open {
        /// Device path.
        port: String,
        /// Driver message.
        reason: String,
    },
    /// The transport failed while sending or awaiting a reply.
    #[error("I/O error during '{command}': {source}")]
    Io {
        /// Command in flight.
        command: LaserCommand,
        /// Transport error.
        #[source]
        source: std::io::Error,
    },
    /// Power-up requested without an unlock code for the access level.
    #[error("no unlock code configured for access level {0}")]
    MissingAccessCode(u8),
}
