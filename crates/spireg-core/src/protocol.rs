//! Wire protocol constants and frame encoding
//!
//! Every transaction starts with a control byte (`SYNC1 | opcode`) followed
//! by a sync byte (`SYNC2 | length[11:8]`). The control byte comes first so
//! the slave can load its transmit register before the master clocks the
//! byte that carries the first reply slot.
//!
//! ```text
//! Write-init:  CTRL(WRITE_INIT)  SYNC|lenHi  lenLo  addrHi  addrLo
//! Write-data:  CTRL(DATA_ACCESS) SYNC|lenHi  data[0..len)
//! Read-init:   CTRL(READ_INIT)   SYNC|lenHi  lenLo  addrHi  addrLo
//! Read-data:   CTRL(DATA_ACCESS) SYNC|lenHi  don't-care[0..len)   -> MISO: 00 00 data[0..len)
//! Status poll: CTRL(STATUS_READ) SYNC        don't-care           -> MISO: 00 00 status
//! ```

/// Sync pattern carried in the high nibble of every control byte
pub const SYNC1: u8 = 0x50;
/// Sync pattern carried in the high nibble of every sync byte
pub const SYNC2: u8 = 0xA0;
/// Mask selecting the sync nibble
pub const SYNC_MASK: u8 = 0xF0;
/// Mask selecting the opcode bits of a control byte
pub const OPCODE_MASK: u8 = 0x03;
/// Mask selecting `length[11:8]` in a sync byte
pub const LEN_HI_MASK: u8 = 0x0F;

/// Byte the slave transmits when it has nothing to say
pub const IDLE_FILL: u8 = 0x00;

/// Default payload buffer size of a slave
pub const DEFAULT_MAX_FRAME_LEN: usize = 512;
/// Largest length the 12-bit wire field can carry
pub const MAX_WIRE_LEN: u16 = 0x0FFF;

/// Bytes in a write-init or read-init frame
pub const INIT_FRAME_LEN: usize = 5;
/// Bytes preceding the payload of a data-access frame
pub const DATA_HEADER_LEN: usize = 2;
/// Bytes in a status poll frame
pub const STATUS_FRAME_LEN: usize = 3;

/// Frame opcodes (low two bits of the control byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Declare a write of `length` bytes at `address`
    WriteInit = 0x0,
    /// Declare a read of `length` bytes at `address`
    ReadInit = 0x1,
    /// Move payload in the direction latched by the last init
    DataAccess = 0x2,
    /// Clock out the read-and-clear status byte
    StatusRead = 0x3,
}

impl Opcode {
    /// Decode the opcode bits of a control byte
    ///
    /// Only the low two bits are inspected, so every byte maps to an opcode.
    pub const fn from_control(byte: u8) -> Self {
        match byte & OPCODE_MASK {
            0x0 => Self::WriteInit,
            0x1 => Self::ReadInit,
            0x2 => Self::DataAccess,
            _ => Self::StatusRead,
        }
    }

    /// Full control byte for this opcode
    pub const fn control_byte(self) -> u8 {
        SYNC1 | self as u8
    }
}

/// Returns true if `byte` carries the control sync nibble
pub const fn is_control(byte: u8) -> bool {
    byte & SYNC_MASK == SYNC1
}

/// Returns true if `byte` carries the second sync nibble
pub const fn is_sync(byte: u8) -> bool {
    byte & SYNC_MASK == SYNC2
}

/// Sync byte carrying `length[11:8]`
pub const fn sync_byte(length: u16) -> u8 {
    SYNC2 | ((length >> 8) as u8 & LEN_HI_MASK)
}

/// Returns true if `length` is acceptable for a slave with `max_frame_len`
/// bytes of payload buffer
pub const fn length_is_valid(length: u16, max_frame_len: usize) -> bool {
    length != 0 && (length as usize) <= max_frame_len
}

/// Encode a write-init or read-init frame
///
/// `opcode` is expected to be [`Opcode::WriteInit`] or [`Opcode::ReadInit`].
pub const fn init_frame(opcode: Opcode, length: u16, address: u16) -> [u8; INIT_FRAME_LEN] {
    let addr = address.to_be_bytes();
    [
        opcode.control_byte(),
        sync_byte(length),
        length as u8,
        addr[0],
        addr[1],
    ]
}

/// Encode the two header bytes of a data-access frame
pub const fn data_header(length: u16) -> [u8; DATA_HEADER_LEN] {
    [Opcode::DataAccess.control_byte(), sync_byte(length)]
}

/// Encode a status poll frame
pub const fn status_frame() -> [u8; STATUS_FRAME_LEN] {
    [Opcode::StatusRead.control_byte(), SYNC2, IDLE_FILL]
}
