//! Diagnostic events recorded by the interrupt path
//!
//! The interrupt handler cannot log, so it pushes a compact record of what
//! it did into a lock-free single-producer/single-consumer queue. The
//! dispatcher drains the queue from the main context.

use core::fmt;
use core::sync::atomic::{AtomicU16, Ordering};

use heapless::spsc::Producer;

use crate::status::StatusFlags;

/// Queue storage size (one slot is kept free by the queue)
pub const EVENT_QUEUE_LEN: usize = 16;

/// Something the frame decoder did that the main context may want to know
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// A control byte was not followed by a valid sync byte
    Desync {
        /// The byte that failed the sync check
        byte: u8,
    },
    /// An init frame carried a length of zero or beyond the buffer
    LengthRejected {
        /// The rejected length
        length: u16,
    },
    /// A data-access frame arrived with no accepted init frame in force
    Unarmed,
    /// A read-init completed and a read request was raised
    ReadRequested {
        /// Register address
        address: u16,
        /// Frame length
        length: u16,
    },
    /// A write payload was collected and a write request was raised
    WriteRequested {
        /// Register address
        address: u16,
        /// Frame length
        length: u16,
    },
    /// A read-data phase finished
    ReadDrained,
    /// A status byte was built and armed for transmission
    StatusLatched(StatusFlags),
    /// The peripheral reported a receive overrun
    Overrun,
    /// The peripheral reported a transmit underrun
    Underrun,
}

impl fmt::Display for FrameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desync { byte } => write!(f, "sync mismatch on 0x{:02X}, frame dropped", byte),
            Self::LengthRejected { length } => write!(f, "rejected frame length {}", length),
            Self::Unarmed => write!(f, "data frame without a valid init, ignored"),
            Self::ReadRequested { address, length } => {
                write!(f, "read request: {} bytes at 0x{:04X}", length, address)
            }
            Self::WriteRequested { address, length } => {
                write!(f, "write request: {} bytes at 0x{:04X}", length, address)
            }
            Self::ReadDrained => write!(f, "read data clocked out"),
            Self::StatusLatched(status) => write!(f, "status latched: {}", status),
            Self::Overrun => write!(f, "receive overrun"),
            Self::Underrun => write!(f, "transmit underrun"),
        }
    }
}

/// Producing end of the event queue, owned by the interrupt half
pub(crate) struct EventTx<'a> {
    producer: Producer<'a, FrameEvent, EVENT_QUEUE_LEN>,
    dropped: &'a AtomicU16,
}

impl<'a> EventTx<'a> {
    pub(crate) fn new(
        producer: Producer<'a, FrameEvent, EVENT_QUEUE_LEN>,
        dropped: &'a AtomicU16,
    ) -> Self {
        Self { producer, dropped }
    }

    /// Record an event, counting it as dropped if the queue is full
    #[inline]
    pub(crate) fn record(&mut self, event: FrameEvent) {
        if self.producer.enqueue(event).is_err() {
            // single writer, so load+store is enough
            let dropped = self.dropped.load(Ordering::Relaxed);
            self.dropped.store(dropped.wrapping_add(1), Ordering::Relaxed);
        }
    }
}
