//! spidev-backed full-duplex bus
//!
//! Every [`FullDuplex::transfer`] becomes one `SPI_IOC_MESSAGE(1)` so chip
//! select stays asserted for the whole frame.

use crate::error::{LinuxSpiError, Result};

use spireg_core::error::{Error as CoreError, Result as CoreResult};
use spireg_core::master::FullDuplex;

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

/// spidev module parameter bounding a single transfer
const BUFSIZ_PARAM: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock in Hz
///
/// Slaves servicing the protocol from an interrupt handler start missing
/// bytes somewhere above 2 MHz.
const DEFAULT_SPEED_HZ: u32 = 1_800_000;

/// Frames are clocked as plain bytes
const BITS_PER_WORD: u8 = 8;

/// Clock polarity and phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Mode from its number, `None` above 3
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Mode0),
            1 => Some(Self::Mode1),
            2 => Some(Self::Mode2),
            3 => Some(Self::Mode3),
            _ => None,
        }
    }

    /// Value for `SPI_IOC_WR_MODE`
    pub fn bits(self) -> u8 {
        self as u8
    }
}

mod ioctl {
    use nix::ioctl_write_ptr;

    const MAGIC: u8 = b'k';

    ioctl_write_ptr!(wr_mode, MAGIC, 1, u8);
    ioctl_write_ptr!(wr_bits_per_word, MAGIC, 3, u8);
    ioctl_write_ptr!(wr_max_speed_hz, MAGIC, 4, u32);

    /// `sizeof(struct spi_ioc_transfer)`
    const TRANSFER_SIZE: u32 = 32;

    /// `SPI_IOC_MESSAGE(n)`, which nix cannot express because the size
    /// depends on `n`
    pub fn message(n: u8) -> libc::c_ulong {
        let size = u32::from(n) * TRANSFER_SIZE;
        ((1u32 << 30) | (size << 16) | (u32::from(MAGIC) << 8)) as libc::c_ulong
    }
}

/// Kernel `struct spi_ioc_transfer`
#[repr(C)]
#[derive(Debug, Default)]
struct Transfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

/// Device path and link settings for [`LinuxSpi::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// spidev node, e.g. `/dev/spidev0.0`
    pub device: String,
    /// Clock in Hz
    pub speed_hz: u32,
    /// Clock polarity and phase
    pub mode: SpiMode,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: SpiMode::Mode0,
        }
    }
}

impl LinuxSpiConfig {
    /// Settings for `device` at 1.8 MHz in mode 0
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Use a different clock
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Use a different clock polarity and phase
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Full-duplex SPI bus on a spidev device
pub struct LinuxSpi {
    file: File,
    max_transfer: usize,
    speed_hz: u32,
}

fn os_error(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// Push mode, word size and clock to the driver
fn configure(fd: RawFd, config: &LinuxSpiConfig) -> Result<()> {
    let mode = config.mode.bits();
    // SAFETY: fd is an open spidev node and the pointee outlives the call
    unsafe { ioctl::wr_mode(fd, &mode) }
        .map_err(|e| LinuxSpiError::SetModeFailed { mode, source: os_error(e) })?;

    let bits = BITS_PER_WORD;
    // SAFETY: as above
    unsafe { ioctl::wr_bits_per_word(fd, &bits) }
        .map_err(|e| LinuxSpiError::SetBitsPerWordFailed { bits, source: os_error(e) })?;

    let speed = config.speed_hz;
    // SAFETY: as above
    unsafe { ioctl::wr_max_speed_hz(fd, &speed) }
        .map_err(|e| LinuxSpiError::SetSpeedFailed { speed, source: os_error(e) })?;

    Ok(())
}

impl LinuxSpi {
    /// Open and configure the device named by `config`
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: opening {}", config.device);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        configure(file.as_raw_fd(), config)?;

        let max_transfer = read_bufsiz(Path::new(BUFSIZ_PARAM)).unwrap_or_else(page_size);
        log::info!(
            "linux_spi: opened {} ({:?}, {} kHz, {} byte transfers)",
            config.device,
            config.mode,
            config.speed_hz / 1000,
            max_transfer
        );

        Ok(Self {
            file,
            max_transfer,
            speed_hz: config.speed_hz,
        })
    }

    /// Clock `tx` out while filling `rx`, under a single chip select
    pub fn spi_transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(LinuxSpiError::LengthMismatch {
                tx: tx.len(),
                rx: rx.len(),
            });
        }
        if tx.len() > self.max_transfer {
            return Err(LinuxSpiError::TooLarge {
                len: tx.len(),
                max: self.max_transfer,
            });
        }
        if tx.is_empty() {
            return Ok(());
        }

        let transfer = Transfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len: tx.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: BITS_PER_WORD,
            ..Default::default()
        };

        // SAFETY: both buffers are live and `len` bytes long for the call
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), ioctl::message(1), &transfer) };
        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed {
                len: tx.len(),
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl FullDuplex for LinuxSpi {
    fn max_transfer_len(&self) -> usize {
        self.max_transfer
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> CoreResult<()> {
        self.spi_transfer(tx, rx).map_err(|e| {
            log::error!("linux_spi: {}", e);
            match e {
                LinuxSpiError::TooLarge { .. } => CoreError::FrameTooLarge,
                _ => CoreError::TransferFailed,
            }
        })
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}

/// Transfer limit from the spidev `bufsiz` parameter
fn read_bufsiz(path: &Path) -> Option<usize> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("linux_spi: cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    match content.trim().parse::<usize>() {
        Ok(size) if size > 0 => Some(size),
        _ => {
            log::warn!("linux_spi: ignoring bufsiz {:?}", content.trim());
            None
        }
    }
}

/// spidev's own default for `bufsiz`
fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).unwrap_or(4096)
}

/// Build a [`LinuxSpiConfig`] from `key=value` programmer options
///
/// `dev` is required; `spispeed` is in kHz and `mode` is 0 to 3.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut device = None;
    let mut config = LinuxSpiConfig::default();

    for &(key, value) in options {
        match key {
            "dev" => device = Some(value),
            "spispeed" => {
                let khz = value
                    .parse::<u32>()
                    .ok()
                    .filter(|&khz| khz > 0)
                    .and_then(|khz| khz.checked_mul(1000))
                    .ok_or_else(|| format!("Invalid spispeed value: {} (kHz, at least 1)", value))?;
                config = config.with_speed(khz);
            }
            "mode" => {
                let mode = value
                    .parse::<u8>()
                    .ok()
                    .and_then(SpiMode::from_index)
                    .ok_or_else(|| format!("Invalid SPI mode: {} (must be 0-3)", value))?;
                config = config.with_mode(mode);
            }
            _ => log::warn!("linux_spi: unknown option {}={}", key, value),
        }
    }

    match device {
        Some(dev) if !dev.is_empty() => Ok(LinuxSpiConfig {
            device: dev.to_string(),
            ..config
        }),
        _ => Err("No device specified. Use dev=/dev/spidevX.Y".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config, LinuxSpiConfig::new("/dev/spidev0.0"));
        assert_eq!(config.speed_hz, 1_800_000);
        assert_eq!(config.mode, SpiMode::Mode0);

        let config =
            parse_options(&[("mode", "3"), ("spispeed", "350"), ("dev", "/dev/spidev1.2")])
                .unwrap();
        assert_eq!(
            config,
            LinuxSpiConfig::new("/dev/spidev1.2")
                .with_speed(350_000)
                .with_mode(SpiMode::Mode3)
        );
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&[]).is_err());
        assert!(parse_options(&[("dev", "")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "0")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "5000000")]).is_err());
    }

    #[test]
    fn test_spi_mode() {
        assert_eq!(SpiMode::from_index(2), Some(SpiMode::Mode2));
        assert_eq!(SpiMode::from_index(4), None);
        assert_eq!(SpiMode::Mode1.bits(), 1);
        assert_eq!(SpiMode::Mode3.bits(), 3);
    }

    #[test]
    fn test_ioc_message_number() {
        assert_eq!(ioctl::message(1), 0x4020_6B00);
        assert_eq!(ioctl::message(2), 0x4040_6B00);
    }

    #[test]
    fn test_read_bufsiz() {
        let dir = std::env::temp_dir().join(format!("spireg-bufsiz-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let param = dir.join("bufsiz");
        std::fs::write(&param, "8192\n").unwrap();
        assert_eq!(read_bufsiz(&param), Some(8192));

        std::fs::write(&param, "0\n").unwrap();
        assert_eq!(read_bufsiz(&param), None);

        assert_eq!(read_bufsiz(&dir.join("missing")), None);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_without_device() {
        assert!(matches!(
            LinuxSpi::open(&LinuxSpiConfig::default()),
            Err(LinuxSpiError::NoDevice)
        ));
    }
}
