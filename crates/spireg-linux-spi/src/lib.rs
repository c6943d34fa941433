//! spireg-linux-spi - Linux spidev support
//!
//! This crate drives a register slave from a Linux host through the
//! `/dev/spidevX.Y` device interface. Each frame is clocked as one
//! full-duplex transfer with chip select held for its whole length.
//!
//! # Example
//!
//! ```no_run
//! use spireg_core::master::RegClient;
//! use spireg_linux_spi::{LinuxSpi, LinuxSpiConfig, SpiMode};
//!
//! // 1.8 MHz in mode 0 unless told otherwise
//! let config = LinuxSpiConfig::new("/dev/spidev0.0")
//!     .with_speed(1_000_000)
//!     .with_mode(SpiMode::Mode0);
//! let spi = LinuxSpi::open(&config)?;
//!
//! let mut client = RegClient::new(spi);
//! client.write(0x1000, &[0xAA, 0x55])?;
//! let mut buf = [0u8; 2];
//! client.read(0x1000, &mut buf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the spireg CLI
//!
//! ```bash
//! # Read the status byte
//! spireg status -p linux_spi:dev=/dev/spidev0.0
//!
//! # Specify SPI speed in kHz
//! spireg read -p linux_spi:dev=/dev/spidev0.0,spispeed=1000 0x1000 16
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - The spidev `bufsiz` parameter bounds the largest frame

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, SpiMode};
pub use error::{LinuxSpiError, Result};

use spireg_core::master::FullDuplex;

/// Open a Linux SPI device and return a boxed bus
///
/// This is a convenience function for use in the CLI programmer dispatch.
///
/// # Example Options
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=1000` - Optional: speed in kHz (default: 1800)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn FullDuplex + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let spi = LinuxSpi::open(&config)?;
    Ok(Box::new(spi))
}
