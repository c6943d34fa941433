//! Bus trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy, tokio)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use maybe_async::maybe_async;

/// Full-duplex SPI bus (sync or async depending on `is_sync` feature)
///
/// Every transfer is one chip-select assertion: `tx` is clocked out while
/// `rx` is filled with the bytes the slave returned in the same slots.
#[maybe_async(AFIT)]
pub trait FullDuplex {
    /// Largest number of bytes a single transfer may carry
    fn max_transfer_len(&self) -> usize;

    /// Clock `tx` out and capture the same number of bytes into `rx`
    ///
    /// `rx` has the same length as `tx`.
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);
}

// Blanket impl for boxed buses to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(feature = "is_sync")]
impl FullDuplex for alloc::boxed::Box<dyn FullDuplex + Send> {
    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        (**self).transfer(tx, rx)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
