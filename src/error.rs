//! Unified error type for the firmware.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! None of these ever halts the control loop: a failed optional peripheral
//! is turned into a disabled capability, a failed read into a placeholder.

use core::fmt;

use crate::features::Capability;

/// Top-level error type used by drivers and start-up code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An optional peripheral did not answer its probe during start-up.
    Unavailable(Capability),

    /// I²C transaction failed.
    Bus,

    /// The device has no fresh sample yet.
    NotReady,

    /// The device returned values outside their documented range.
    InvalidData,

    /// OLED initialisation or flush failed.
    Display,

    /// The device did not finish an operation in time.
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unavailable(cap) => write!(f, "{} unavailable", cap.name()),
            Error::Bus => f.write_str("bus error"),
            Error::NotReady => f.write_str("no sample ready"),
            Error::InvalidData => f.write_str("invalid data"),
            Error::Display => f.write_str("display error"),
            Error::Timeout => f.write_str("timeout"),
        }
    }
}
