//! spireg-dummy - In-memory register map and simulated slave for testing
//!
//! This crate provides a register map that lives in memory and a simulated
//! SPI bus that runs the real slave state machine on the other end. It's
//! useful for testing and development without real hardware.
//!
//! # Example
//!
//! ```
//! use spireg_core::master::RegClient;
//! use spireg_dummy::{DummyRegs, SimulatedSlave};
//!
//! let mut client = RegClient::new(SimulatedSlave::new(DummyRegs::flat()));
//! client.write(0x1234, &[0xAA, 0xBB])?;
//!
//! let mut buf = [0u8; 2];
//! client.read(0x1234, &mut buf)?;
//! assert_eq!(buf, [0xAA, 0xBB]);
//! # Ok::<(), spireg_core::Error>(())
//! ```

pub mod bus;
pub mod error;
mod map_file;
pub mod regs;

pub use bus::{DispatchMode, SimulatedSlave};
pub use error::{MapError, Result};
pub use regs::{DummyRegs, Region};

/// Parse programmer options and build a simulated slave
///
/// # Example Options
///
/// - `map=regs.toml` - Optional: register map file
/// - `flat=1` - Optional: map the whole address space
/// - `bufsiz=4096` - Optional: largest transfer in bytes
///
/// Without `map` or `flat`, the two 512-byte test registers at `0x1000`
/// and `0xF020` are mapped.
pub fn parse_options(
    options: &[(&str, &str)],
) -> std::result::Result<SimulatedSlave<DummyRegs>, String> {
    let mut map: Option<&str> = None;
    let mut flat = false;
    let mut bufsiz = bus::DEFAULT_MAX_TRANSFER_LEN;

    for (key, value) in options {
        match *key {
            "map" => map = Some(*value),
            "flat" => {
                flat = match *value {
                    "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    _ => return Err(format!("Invalid flat value: {}", value)),
                };
            }
            "bufsiz" => {
                bufsiz = value
                    .parse()
                    .map_err(|_| format!("Invalid bufsiz value: {}", value))?;
                if bufsiz == 0 {
                    return Err("bufsiz must be at least 1".to_string());
                }
            }
            _ => {
                log::warn!("sim: Unknown option: {}={}", key, value);
            }
        }
    }

    let regs = match (map, flat) {
        (Some(_), true) => return Err("map and flat are mutually exclusive".to_string()),
        (Some(path), false) => DummyRegs::from_toml_file(path).map_err(|e| e.to_string())?,
        (None, true) => DummyRegs::flat(),
        (None, false) => DummyRegs::test_regs(),
    };

    for region in regs.regions() {
        log::debug!(
            "sim: region '{}' at 0x{:04X} ({} bytes{})",
            region.name,
            region.base,
            region.size,
            if region.readonly { ", read-only" } else { "" }
        );
    }

    Ok(SimulatedSlave::new(regs).with_max_transfer_len(bufsiz))
}
