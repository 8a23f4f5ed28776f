//! Laser controller command set.

use serde::{Deserialize, Serialize};

/// Commands are ASCII words separated by spaces and terminated by a carriage return.
pub const TERMINATOR: char = '\r';

/// A single controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaserCommand {
    /// Raises the session to `level` using its unlock code.
    Unlock {
        /// Access level to enter.
        level: u8,
        /// Unlock code; never logged.
        code: u32,
    },
    /// Switches laser emission on or off.
    Emission(bool),
    /// Sets the diode drive current.
    SetCurrent {
        /// Drive current in mA.
        milliamps: u32,
    },
    /// Requests the current status line.
    ReadStatus,
}

impl LaserCommand {
    /// Wire form, including the terminator.
    pub fn encode(&self) -> String {
        let body = match *self {
            Self::Unlock { level, code } => format!("c u {level} {code}"),
            Self::Emission(on) => format!("e {}", u8::from(on)),
            Self::SetCurrent { milliamps } => format!("c 3 {milliamps}"),
            Self::ReadStatus => String::from("r r"),
        };
        format!("{body}{TERMINATOR}")
    }
}

/// Log-safe rendering; unlock codes are masked.
impl std::fmt::Display for LaserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Unlock { level, .. } => write!(f, "unlock access level {level}"),
            Self::Emission(true) => write!(f, "emission on"),
            Self::Emission(false) => write!(f, "emission off"),
            Self::SetCurrent { milliamps } => write!(f, "set diode current {milliamps} mA"),
            Self::ReadStatus => write!(f, "read status"),
        }
    }
}
