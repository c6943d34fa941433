//! Register map capability
//!
//! The slave core never stores register contents itself. It hands complete
//! frames to a [`RegisterMap`] from the deferred dispatcher, outside the
//! interrupt context, and reports any failure through the status byte.

use core::fmt;

/// Reasons a register map can refuse an access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// No register is mapped at the start address
    Unmapped,
    /// The access runs past the end of the mapped range
    OutOfBounds,
    /// The range is mapped read-only
    ReadOnly,
    /// The access is not aligned to the register width
    Misaligned,
    /// The backing device failed
    Device,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped => write!(f, "address not mapped"),
            Self::OutOfBounds => write!(f, "access runs past the mapped range"),
            Self::ReadOnly => write!(f, "range is read-only"),
            Self::Misaligned => write!(f, "misaligned access"),
            Self::Device => write!(f, "backing device error"),
        }
    }
}

/// Addressable storage exposed by a slave
///
/// `address` is an opaque 16-bit key into the implementor's own address
/// space; the buffer length is the frame length. How overlapping or
/// partially mapped ranges are treated is up to the implementor.
pub trait RegisterMap {
    /// Fill `buf` with `buf.len()` bytes starting at `address`
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), AccessError>;

    /// Store `data` starting at `address`
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), AccessError>;
}

impl<T: RegisterMap + ?Sized> RegisterMap for &mut T {
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), AccessError> {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), AccessError> {
        (**self).write(address, data)
    }
}
