//! Frame decoder and transmit sequencer
//!
//! The decoder consumes one received byte per call and the sequencer
//! produces one transmit byte per call. Both run in interrupt context:
//! every path is a handful of comparisons and stores, with no loops.
//!
//! Transmit-empty fires when the previously loaded byte moves into the
//! shift register, so a byte loaded while byte `n` is on the wire goes out
//! as byte `n + 1`. The sync byte of a read-data frame therefore counts as
//! the first slot of the read cursor: the last payload byte is loaded while
//! the second to last one is being clocked.
//!
//! A data-access frame is only honoured after an init frame has been
//! accepted in full. Starting a new init disarms the decoder until its
//! address arrives, so a rejected or truncated init never leaves an older
//! length and address behind for the next data phase. An accepted init
//! stays armed across repeated data phases until the next init.

use crate::protocol::{
    is_control, is_sync, length_is_valid, Opcode, IDLE_FILL, LEN_HI_MASK,
};
use crate::status::StatusFlags;

use super::events::{EventTx, FrameEvent};
use super::mailbox::Mailbox;
use super::Requests;

/// Receive-side state of the frame decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for a control byte (initial and idle state)
    AwaitControl,
    /// Waiting for the sync byte that follows a control byte
    AwaitSync,
    /// Waiting for `length[7:0]` of an init frame
    AwaitLenLow,
    /// Waiting for `address[15:8]`
    AwaitAddrHi,
    /// Waiting for `address[7:0]`
    AwaitAddrLo,
    /// Counting the slots of a read-data phase
    TransferRead,
    /// Collecting the payload of a write-data phase
    TransferWrite,
    /// Waiting for the byte that carries the status out
    AwaitStatusSent,
}

/// What the transmit sequencer loads on the next transmit-empty event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Filler bytes
    Idle,
    /// Payload bytes of a read
    Data,
    /// The latched status byte, once
    Status,
}

/// Direction latched by the most recent init frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Data-access frames move payload from slave to master
    Read,
    /// Data-access frames move payload from master to slave
    Write,
}

pub(crate) struct Decoder {
    state: RxState,
    queued: RxState,
    direction: Direction,
    armed: bool,
    len_hi: u16,
    length: u16,
    address: u16,
    read_cursor: u16,
    write_cursor: u16,
    tx_mode: TxMode,
    tx_cursor: usize,
    status: StatusFlags,
}

impl Decoder {
    pub(crate) const fn new() -> Self {
        Self {
            state: RxState::AwaitControl,
            queued: RxState::AwaitControl,
            direction: Direction::Write,
            armed: false,
            len_hi: 0,
            length: 0,
            address: 0,
            read_cursor: 0,
            write_cursor: 0,
            tx_mode: TxMode::Idle,
            tx_cursor: 0,
            status: StatusFlags::empty(),
        }
    }

    pub(crate) fn state(&self) -> RxState {
        self.state
    }

    pub(crate) fn tx_mode(&self) -> TxMode {
        self.tx_mode
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn armed(&self) -> bool {
        self.armed
    }

    /// Advance the state machine by one received byte
    pub(crate) fn receive<const N: usize>(
        &mut self,
        byte: u8,
        mailbox: &Mailbox<N>,
        events: &mut EventTx<'_>,
    ) -> Requests {
        let mut raised = Requests::empty();

        match self.state {
            RxState::AwaitControl => {
                self.tx_mode = TxMode::Idle;
                if is_control(byte) {
                    self.state = RxState::AwaitSync;
                    self.queued = self.decode_opcode(Opcode::from_control(byte), mailbox, events);
                }
            }

            RxState::AwaitSync => {
                self.read_cursor = self.read_cursor.wrapping_add(1);
                if is_sync(byte) {
                    self.len_hi = u16::from(byte & LEN_HI_MASK) << 8;
                    self.state = self.queued;
                } else {
                    self.tx_mode = TxMode::Idle;
                    self.state = RxState::AwaitControl;
                    events.record(FrameEvent::Desync { byte });
                }
            }

            RxState::AwaitLenLow => {
                let length = self.len_hi | u16::from(byte);
                if length_is_valid(length, N) {
                    self.length = length;
                    self.state = RxState::AwaitAddrHi;
                } else {
                    self.state = RxState::AwaitControl;
                    events.record(FrameEvent::LengthRejected { length });
                }
            }

            RxState::AwaitAddrHi => {
                self.address = u16::from(byte) << 8;
                self.state = RxState::AwaitAddrLo;
            }

            RxState::AwaitAddrLo => {
                self.address |= u16::from(byte);
                self.state = RxState::AwaitControl;
                self.armed = true;
                if self.direction == Direction::Read {
                    mailbox.raise_read(self.length, self.address);
                    raised |= Requests::READ;
                    events.record(FrameEvent::ReadRequested {
                        address: self.address,
                        length: self.length,
                    });
                }
            }

            RxState::TransferRead => {
                self.read_cursor = self.read_cursor.wrapping_add(1);
                if self.read_cursor >= self.length {
                    self.tx_mode = TxMode::Idle;
                    self.state = RxState::AwaitControl;
                    events.record(FrameEvent::ReadDrained);
                }
            }

            RxState::TransferWrite => {
                // length was bounded by N when it was accepted
                mailbox.store_payload(usize::from(self.write_cursor), byte);
                self.write_cursor += 1;
                if self.write_cursor >= self.length {
                    mailbox.raise_write(self.length, self.address);
                    raised |= Requests::WRITE;
                    self.state = RxState::AwaitControl;
                    events.record(FrameEvent::WriteRequested {
                        address: self.address,
                        length: self.length,
                    });
                }
            }

            RxState::AwaitStatusSent => {
                self.tx_mode = TxMode::Idle;
                self.state = RxState::AwaitControl;
            }
        }

        raised
    }

    /// Handle the opcode of an accepted control byte, returning the state
    /// to enter once the sync byte checks out
    fn decode_opcode<const N: usize>(
        &mut self,
        opcode: Opcode,
        mailbox: &Mailbox<N>,
        events: &mut EventTx<'_>,
    ) -> RxState {
        match opcode {
            Opcode::DataAccess if !self.armed => {
                events.record(FrameEvent::Unarmed);
                RxState::AwaitControl
            }
            Opcode::DataAccess => match self.direction {
                Direction::Read => {
                    self.read_cursor = 0;
                    self.tx_cursor = 0;
                    self.tx_mode = TxMode::Data;
                    RxState::TransferRead
                }
                Direction::Write => {
                    self.write_cursor = 0;
                    RxState::TransferWrite
                }
            },
            Opcode::ReadInit => {
                self.direction = Direction::Read;
                self.armed = false;
                RxState::AwaitLenLow
            }
            Opcode::WriteInit => {
                self.direction = Direction::Write;
                self.armed = false;
                RxState::AwaitLenLow
            }
            Opcode::StatusRead => {
                self.status = mailbox.take_status();
                self.tx_mode = TxMode::Status;
                events.record(FrameEvent::StatusLatched(self.status));
                RxState::AwaitStatusSent
            }
        }
    }

    /// Byte to load into the transmit register
    pub(crate) fn next_tx<const N: usize>(&mut self, mailbox: &Mailbox<N>) -> u8 {
        match self.tx_mode {
            TxMode::Status => {
                self.tx_mode = TxMode::Idle;
                self.status.bits()
            }
            TxMode::Data => {
                let byte = mailbox.payload_byte(self.tx_cursor);
                self.tx_cursor += 1;
                if self.tx_cursor == N {
                    self.tx_cursor = 0;
                }
                byte
            }
            TxMode::Idle => {
                self.tx_cursor = 0;
                IDLE_FILL
            }
        }
    }
}
