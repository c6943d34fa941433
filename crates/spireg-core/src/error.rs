//! Error types for spireg-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Frame errors
    /// Frame length is zero or larger than the slave's maximum frame size
    InvalidLength,
    /// Frame does not fit in a single bus transfer
    FrameTooLarge,

    // Bus errors
    /// SPI transfer failed
    TransferFailed,
    /// The slave never reported the expected completion bit
    Timeout,
    /// Receive overrun or transmit underrun persisted after all retries
    TransportFault,

    // Register errors
    /// The slave's register map rejected a read
    ReadRegister,
    /// The slave's register map rejected a write
    WriteRegister,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength => write!(f, "invalid frame length"),
            Self::FrameTooLarge => write!(f, "frame exceeds the bus transfer limit"),
            Self::TransferFailed => write!(f, "SPI transfer failed"),
            Self::Timeout => write!(f, "slave did not complete the request in time"),
            Self::TransportFault => {
                write!(f, "receive overrun or transmit underrun persisted after retries")
            }
            Self::ReadRegister => write!(f, "slave reported a register read error"),
            Self::WriteRegister => write!(f, "slave reported a register write error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
