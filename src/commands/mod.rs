//! CLI command implementations
//!
//! Every device command runs against a [`RegClient`](spireg_core::master::RegClient)
//! on whatever bus the programmer string selected. Accesses longer than the
//! slave's frame size are split into consecutive frames.

mod list;
pub mod regs;
pub mod stress;

pub use list::list_programmers;

/// Errors raised by the commands themselves
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Access runs past the end of the 16-bit address space
    #[error("{len} bytes at 0x{address:04X} run past the end of the address space")]
    AddressOverflow { address: u16, len: usize },

    /// Nothing to write
    #[error("no data to write")]
    NoData,

    /// Data read back differs from what was written
    #[error("read-back mismatch at 0x{address:04X}: wrote 0x{expected:02X}, read 0x{found:02X}")]
    Mismatch { address: u32, expected: u8, found: u8 },
}

/// Split `len` bytes at `address` into frames of at most `max_frame_len`
///
/// Yields `(address, offset, len)` per frame.
pub fn frames(
    address: u16,
    len: usize,
    max_frame_len: usize,
) -> Result<impl Iterator<Item = (u16, usize, usize)>, CommandError> {
    if len == 0 {
        return Err(CommandError::NoData);
    }
    if usize::from(address) + len > 0x1_0000 {
        return Err(CommandError::AddressOverflow { address, len });
    }
    let step = max_frame_len.max(1);
    Ok((0..len).step_by(step).map(move |offset| {
        let frame_addr = (usize::from(address) + offset) as u16;
        (frame_addr, offset, step.min(len - offset))
    }))
}

/// Compare `found` against `expected`, reporting the first difference
pub fn compare(address: u16, expected: &[u8], found: &[u8]) -> Result<(), CommandError> {
    match expected.iter().zip(found).position(|(e, f)| e != f) {
        Some(i) => Err(CommandError::Mismatch {
            address: u32::from(address) + i as u32,
            expected: expected[i],
            found: found[i],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        let all: Vec<_> = frames(0x1000, 1100, 512).unwrap().collect();
        assert_eq!(
            all,
            [(0x1000, 0, 512), (0x1200, 512, 512), (0x1400, 1024, 76)]
        );

        let all: Vec<_> = frames(0xFFFE, 2, 512).unwrap().collect();
        assert_eq!(all, [(0xFFFE, 0, 2)]);
    }

    #[test]
    fn test_frames_rejects() {
        assert!(matches!(frames(0x1000, 0, 512), Err(CommandError::NoData)));
        assert!(matches!(
            frames(0xFFFF, 2, 512),
            Err(CommandError::AddressOverflow { .. })
        ));
    }

    #[test]
    fn test_compare() {
        assert!(compare(0x1000, &[1, 2, 3], &[1, 2, 3]).is_ok());
        match compare(0x1000, &[1, 2, 3], &[1, 9, 3]) {
            Err(CommandError::Mismatch {
                address,
                expected,
                found,
            }) => {
                assert_eq!(address, 0x1001);
                assert_eq!(expected, 2);
                assert_eq!(found, 9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
