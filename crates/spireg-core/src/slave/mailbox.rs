//! State shared between the interrupt context and the main context
//!
//! Every variable here has exactly one writer role and one reader role:
//!
//! | Variable | Writer | Reader |
//! |---|---|---|
//! | `read_req`, `write_req` (set) | interrupt | dispatcher (consumes) |
//! | `read_len`, `read_addr` | interrupt | dispatcher |
//! | `write_len`, `write_addr` | interrupt | dispatcher |
//! | `read_ready`, `write_complete`, `*_reg_error` (set) | dispatcher | interrupt (read-and-clear) |
//! | `rx_overrun`, `tx_underrun` | interrupt | interrupt (read-and-clear) |
//! | `payload` | interrupt on write, dispatcher on read | the other side |
//!
//! Requests are published with `Release` after the data they describe and
//! consumed with an `Acquire` swap, so the dispatcher always sees the
//! length, address and payload that belong to the request it took. Each
//! direction has its own length and address, so a read-init completing
//! while a write is still pending leaves the write's request intact.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::status::StatusFlags;

#[allow(clippy::declare_interior_mutable_const)]
const PAYLOAD_INIT: AtomicU8 = AtomicU8::new(0);

pub(crate) struct Mailbox<const N: usize> {
    payload: [AtomicU8; N],
    read_len: AtomicU16,
    read_addr: AtomicU16,
    write_len: AtomicU16,
    write_addr: AtomicU16,

    read_req: AtomicBool,
    write_req: AtomicBool,

    read_ready: AtomicBool,
    write_complete: AtomicBool,
    read_reg_error: AtomicBool,
    write_reg_error: AtomicBool,

    rx_overrun: AtomicBool,
    tx_underrun: AtomicBool,

    pub(crate) dropped_events: AtomicU16,
}

impl<const N: usize> Mailbox<N> {
    pub(crate) const fn new() -> Self {
        Self {
            payload: [PAYLOAD_INIT; N],
            read_len: AtomicU16::new(0),
            read_addr: AtomicU16::new(0),
            write_len: AtomicU16::new(0),
            write_addr: AtomicU16::new(0),
            read_req: AtomicBool::new(false),
            write_req: AtomicBool::new(false),
            read_ready: AtomicBool::new(false),
            write_complete: AtomicBool::new(false),
            read_reg_error: AtomicBool::new(false),
            write_reg_error: AtomicBool::new(false),
            rx_overrun: AtomicBool::new(false),
            tx_underrun: AtomicBool::new(false),
            dropped_events: AtomicU16::new(0),
        }
    }

    // ---- interrupt side -------------------------------------------------

    #[inline]
    pub(crate) fn store_payload(&self, index: usize, byte: u8) {
        self.payload[index].store(byte, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn payload_byte(&self, index: usize) -> u8 {
        self.payload[index].load(Ordering::Relaxed)
    }

    pub(crate) fn raise_read(&self, length: u16, address: u16) {
        self.read_len.store(length, Ordering::Relaxed);
        self.read_addr.store(address, Ordering::Relaxed);
        self.read_req.store(true, Ordering::Release);
    }

    pub(crate) fn raise_write(&self, length: u16, address: u16) {
        self.write_len.store(length, Ordering::Relaxed);
        self.write_addr.store(address, Ordering::Relaxed);
        self.write_req.store(true, Ordering::Release);
    }

    pub(crate) fn latch_overrun(&self) {
        self.rx_overrun.store(true, Ordering::Relaxed);
    }

    pub(crate) fn latch_underrun(&self) {
        self.tx_underrun.store(true, Ordering::Relaxed);
    }

    /// Build the status byte, clearing every flag that contributed to it
    pub(crate) fn take_status(&self) -> StatusFlags {
        let mut status = StatusFlags::empty();
        status.set(
            StatusFlags::RX_READY,
            self.read_ready.swap(false, Ordering::AcqRel),
        );
        status.set(
            StatusFlags::WRITE_COMPLETE,
            self.write_complete.swap(false, Ordering::AcqRel),
        );
        status.set(
            StatusFlags::RX_OVERRUN,
            self.rx_overrun.swap(false, Ordering::Relaxed),
        );
        status.set(
            StatusFlags::TX_UNDERRUN,
            self.tx_underrun.swap(false, Ordering::Relaxed),
        );
        status.set(
            StatusFlags::WRITE_REG_ERROR,
            self.write_reg_error.swap(false, Ordering::AcqRel),
        );
        status.set(
            StatusFlags::READ_REG_ERROR,
            self.read_reg_error.swap(false, Ordering::AcqRel),
        );
        status
    }

    // ---- dispatcher side ------------------------------------------------

    /// Consume a pending read request, returning its `(length, address)`
    pub(crate) fn take_read(&self) -> Option<(u16, u16)> {
        self.read_req
            .swap(false, Ordering::AcqRel)
            .then(|| {
                (
                    self.read_len.load(Ordering::Relaxed),
                    self.read_addr.load(Ordering::Relaxed),
                )
            })
    }

    /// Consume a pending write request, returning its `(length, address)`
    pub(crate) fn take_write(&self) -> Option<(u16, u16)> {
        self.write_req
            .swap(false, Ordering::AcqRel)
            .then(|| {
                (
                    self.write_len.load(Ordering::Relaxed),
                    self.write_addr.load(Ordering::Relaxed),
                )
            })
    }

    pub(crate) fn copy_out(&self, dst: &mut [u8]) {
        for (slot, byte) in self.payload.iter().zip(dst.iter_mut()) {
            *byte = slot.load(Ordering::Relaxed);
        }
    }

    pub(crate) fn copy_in(&self, src: &[u8]) {
        for (slot, byte) in self.payload.iter().zip(src.iter()) {
            slot.store(*byte, Ordering::Relaxed);
        }
    }

    pub(crate) fn complete_read(&self, failed: bool) {
        self.read_reg_error.store(failed, Ordering::Release);
        self.read_ready.store(true, Ordering::Release);
    }

    pub(crate) fn complete_write(&self, failed: bool) {
        self.write_reg_error.store(failed, Ordering::Release);
        self.write_complete.store(true, Ordering::Release);
    }

    // ---- observers ------------------------------------------------------

    pub(crate) fn read_pending(&self) -> bool {
        self.read_req.load(Ordering::Acquire)
    }

    pub(crate) fn write_pending(&self) -> bool {
        self.write_req.load(Ordering::Acquire)
    }

    /// Status flags as they stand, without clearing anything
    pub(crate) fn peek_status(&self) -> StatusFlags {
        let mut status = StatusFlags::empty();
        status.set(StatusFlags::RX_READY, self.read_ready.load(Ordering::Acquire));
        status.set(
            StatusFlags::WRITE_COMPLETE,
            self.write_complete.load(Ordering::Acquire),
        );
        status.set(StatusFlags::RX_OVERRUN, self.rx_overrun.load(Ordering::Relaxed));
        status.set(StatusFlags::TX_UNDERRUN, self.tx_underrun.load(Ordering::Relaxed));
        status.set(
            StatusFlags::WRITE_REG_ERROR,
            self.write_reg_error.load(Ordering::Acquire),
        );
        status.set(
            StatusFlags::READ_REG_ERROR,
            self.read_reg_error.load(Ordering::Acquire),
        );
        status
    }
}
