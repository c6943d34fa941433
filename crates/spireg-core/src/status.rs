//! Slave status byte
//!
//! The status byte is assembled on demand when a status poll arrives. Every
//! bit is read-and-clear: observing it in a status frame resets the flag it
//! was built from.

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Bits of the status byte returned by a status poll
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u8 {
        /// Read data has been staged and can be clocked out
        const RX_READY        = 1 << 0;
        /// The last write payload was committed to the register map
        const WRITE_COMPLETE  = 1 << 1;
        /// The slave peripheral reported a receive overrun
        const RX_OVERRUN      = 1 << 2;
        /// The slave peripheral reported a transmit underrun
        const TX_UNDERRUN     = 1 << 3;
        /// The register map rejected a write
        const WRITE_REG_ERROR = 1 << 4;
        /// The register map rejected a read
        const READ_REG_ERROR  = 1 << 5;

        /// Hardware-detected framing hazards
        const TRANSPORT_ERROR = Self::RX_OVERRUN.bits() | Self::TX_UNDERRUN.bits();
        /// Errors reported by the register map
        const REGISTER_ERROR = Self::WRITE_REG_ERROR.bits() | Self::READ_REG_ERROR.bits();
    }
}

impl StatusFlags {
    /// Returns true if the slave saw an overrun or underrun
    pub fn has_transport_error(self) -> bool {
        self.intersects(Self::TRANSPORT_ERROR)
    }

    /// Returns true if the register map rejected an access
    pub fn has_register_error(self) -> bool {
        self.intersects(Self::REGISTER_ERROR)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0x00 (none)");
        }
        write!(f, "0x{:02X} (", self.bits())?;
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        write!(f, ")")
    }
}
