//! SPI slave: frame decoder, transmit sequencer and deferred dispatcher
//!
//! A [`Slave`] owns everything the two execution contexts share. Split it
//! once at startup into a [`SlaveIsr`] for the SPI interrupt handler and a
//! [`Dispatcher`] for the main loop:
//!
//! ```ignore
//! use static_cell::StaticCell;
//! use spireg_core::slave::{IrqStatus, Slave};
//!
//! static SLAVE: StaticCell<Slave> = StaticCell::new();
//!
//! let slave = SLAVE.init(Slave::new());
//! let (isr, mut dispatcher) = slave.split();
//! install_spi_handler(isr);
//!
//! loop {
//!     dispatcher.update(&mut registers);
//! }
//! ```
//!
//! The interrupt half never blocks, allocates or logs. Everything it needs
//! to tell the main context goes through atomics or the event queue.

mod decoder;
mod dispatcher;
mod events;
mod isr;
mod mailbox;

use bitflags::bitflags;
use heapless::spsc::Queue;

use crate::protocol::DEFAULT_MAX_FRAME_LEN;
use crate::status::StatusFlags;

pub use decoder::{Direction, RxState, TxMode};
pub use dispatcher::Dispatcher;
pub use events::{FrameEvent, EVENT_QUEUE_LEN};
pub use isr::{IrqGate, IrqStatus, IsrOutcome, SlaveIsr};

use decoder::Decoder;
use events::EventTx;
use mailbox::Mailbox;

bitflags! {
    /// Requests handed from the interrupt context to the dispatcher
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Requests: u8 {
        /// A read-init completed; the register map must fill the payload
        const READ  = 1 << 0;
        /// A write payload is complete; the register map must commit it
        const WRITE = 1 << 1;
    }
}

/// Protocol state of one SPI slave with an `N`-byte payload buffer
///
/// `N` bounds the accepted frame length.
pub struct Slave<const N: usize = DEFAULT_MAX_FRAME_LEN> {
    decoder: Decoder,
    mailbox: Mailbox<N>,
    scratch: [u8; N],
    events: Queue<FrameEvent, EVENT_QUEUE_LEN>,
}

impl<const N: usize> Slave<N> {
    const NONEMPTY: () = assert!(N > 0, "payload buffer must not be empty");

    /// Create a slave in the `AwaitControl` state with all flags clear
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONEMPTY;
        Self {
            decoder: Decoder::new(),
            mailbox: Mailbox::new(),
            scratch: [0; N],
            events: Queue::new(),
        }
    }

    /// Hand out the interrupt half and the main-context half
    pub fn split(&mut self) -> (SlaveIsr<'_, N>, Dispatcher<'_, N>) {
        let Self {
            decoder,
            mailbox,
            scratch,
            events,
        } = self;
        let mailbox: &Mailbox<N> = mailbox;
        let (producer, consumer) = events.split();

        let isr = SlaveIsr::new(
            decoder,
            mailbox,
            EventTx::new(producer, &mailbox.dropped_events),
        );
        let dispatcher = Dispatcher::new(mailbox, scratch, consumer);
        (isr, dispatcher)
    }

    /// Largest frame length this slave accepts
    pub const fn max_frame_len(&self) -> usize {
        N
    }

    /// Current decoder state
    pub fn state(&self) -> RxState {
        self.decoder.state()
    }

    /// Current transmit mode
    pub fn tx_mode(&self) -> TxMode {
        self.decoder.tx_mode()
    }

    /// Direction latched by the last init frame
    pub fn direction(&self) -> Direction {
        self.decoder.direction()
    }

    /// Whether an accepted init frame is in force for the next data phase
    pub fn armed(&self) -> bool {
        self.decoder.armed()
    }

    /// Requests raised but not yet serviced
    pub fn pending(&self) -> Requests {
        let mut pending = Requests::empty();
        pending.set(Requests::READ, self.mailbox.read_pending());
        pending.set(Requests::WRITE, self.mailbox.write_pending());
        pending
    }

    /// Status flags the next status poll would report, without clearing them
    pub fn peek_status(&self) -> StatusFlags {
        self.mailbox.peek_status()
    }
}

impl<const N: usize> Default for Slave<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{data_header, init_frame, status_frame, Opcode};
    use crate::regs::{AccessError, RegisterMap};
    use std::vec;
    use std::vec::Vec;

    /// Clocks bytes through a slave the way a full-duplex peripheral does:
    /// transmit-empty at the start of each byte, receive-full at its end
    struct Wire<'a, const N: usize> {
        isr: SlaveIsr<'a, N>,
        tdr: u8,
        raised: Requests,
    }

    impl<'a, const N: usize> Wire<'a, N> {
        fn new(isr: SlaveIsr<'a, N>) -> Self {
            Self {
                isr,
                tdr: 0,
                raised: Requests::empty(),
            }
        }

        fn clock(&mut self, mosi: &[u8]) -> Vec<u8> {
            let mut miso = Vec::with_capacity(mosi.len());
            for &byte in mosi {
                miso.push(self.tdr);
                if let Some(next) = self.isr.on_interrupt(IrqStatus::tx_ready()).tx {
                    self.tdr = next;
                }
                self.raised |= self.isr.on_interrupt(IrqStatus::received(byte)).raised;
            }
            miso
        }

        fn take_raised(&mut self) -> Requests {
            core::mem::take(&mut self.raised)
        }

        fn write(&mut self, address: u16, data: &[u8]) {
            let length = data.len() as u16;
            self.clock(&init_frame(Opcode::WriteInit, length, address));
            self.clock(&data_header(length));
            self.clock(data);
        }

        fn read_init(&mut self, address: u16, length: u16) {
            self.clock(&init_frame(Opcode::ReadInit, length, address));
        }

        fn read_data(&mut self, length: usize) -> Vec<u8> {
            let mut frame = data_header(length as u16).to_vec();
            frame.resize(frame.len() + length, 0);
            let miso = self.clock(&frame);
            miso[2..].to_vec()
        }

        fn status(&mut self) -> u8 {
            self.clock(&status_frame())[2]
        }
    }

    struct Store {
        mem: Vec<u8>,
        reads: Vec<(u16, usize)>,
        writes: Vec<(u16, Vec<u8>)>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl Store {
        fn new() -> Self {
            Self {
                mem: vec![0; 0x10000],
                reads: Vec::new(),
                writes: Vec::new(),
                fail_reads: false,
                fail_writes: false,
            }
        }
    }

    impl RegisterMap for Store {
        fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), AccessError> {
            self.reads.push((address, buf.len()));
            if self.fail_reads {
                return Err(AccessError::Unmapped);
            }
            let start = usize::from(address);
            buf.copy_from_slice(&self.mem[start..start + buf.len()]);
            Ok(())
        }

        fn write(&mut self, address: u16, data: &[u8]) -> Result<(), AccessError> {
            self.writes.push((address, data.to_vec()));
            if self.fail_writes {
                return Err(AccessError::ReadOnly);
            }
            let start = usize::from(address);
            self.mem[start..start + data.len()].copy_from_slice(data);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Gate {
        masked: bool,
        masks: u32,
        unmasks: u32,
    }

    impl IrqGate for Gate {
        fn mask(&mut self) {
            assert!(!self.masked);
            self.masked = true;
            self.masks += 1;
        }

        fn unmask(&mut self) {
            assert!(self.masked);
            self.masked = false;
            self.unmasks += 1;
        }
    }

    #[test]
    fn test_write_two_bytes() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        {
            let (isr, mut dispatcher) = slave.split();
            let mut wire = Wire::new(isr);

            wire.clock(&[0x50, 0xA0, 0x02, 0x12, 0x34]);
            assert!(wire.take_raised().is_empty());
            wire.clock(&[0x52, 0xA0, 0xAA]);
            assert!(wire.take_raised().is_empty());
            wire.clock(&[0xBB]);
            assert_eq!(wire.take_raised(), Requests::WRITE);

            assert_eq!(dispatcher.update(&mut store), Requests::WRITE);
            assert_eq!(dispatcher.update(&mut store), Requests::empty());
        }

        assert_eq!(store.writes, vec![(0x1234, vec![0xAA, 0xBB])]);
        assert!(store.reads.is_empty());
        assert_eq!(slave.peek_status(), StatusFlags::WRITE_COMPLETE);
        assert!(slave.pending().is_empty());
        assert_eq!(slave.state(), RxState::AwaitControl);
    }

    #[test]
    fn test_read_two_bytes() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        store.mem[0x1234] = 0x01;
        store.mem[0x1235] = 0x02;

        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.read_init(0x1234, 2);
        assert_eq!(wire.take_raised(), Requests::READ);

        assert_eq!(dispatcher.update(&mut store), Requests::READ);
        assert_eq!(store.reads, vec![(0x1234, 2)]);

        assert_eq!(wire.clock(&status_frame()), vec![0x00, 0x00, 0x01]);
        assert_eq!(wire.clock(&[0x52, 0xA0, 0x00, 0x00]), vec![0x00, 0x00, 0x01, 0x02]);
        assert_eq!(wire.isr.state(), RxState::AwaitControl);
        assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
    }

    #[test]
    fn test_status_is_read_and_clear() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.write(0x0100, &[1, 2, 3]);
        dispatcher.update(&mut store);

        assert_eq!(wire.status(), StatusFlags::WRITE_COMPLETE.bits());
        assert_eq!(wire.status(), 0x00);
    }

    #[test]
    fn test_round_trip() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        let pattern: Vec<u8> = (0..64u8).map(|i| i.wrapping_mul(37) ^ 0x5A).collect();
        wire.write(0x2000, &pattern);
        dispatcher.update(&mut store);
        assert_eq!(wire.status(), StatusFlags::WRITE_COMPLETE.bits());

        wire.read_init(0x2000, pattern.len() as u16);
        dispatcher.update(&mut store);
        assert_eq!(wire.status(), StatusFlags::RX_READY.bits());
        assert_eq!(wire.read_data(pattern.len()), pattern);
    }

    #[test]
    fn test_full_length_frame() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        let pattern: Vec<u8> = (0..DEFAULT_MAX_FRAME_LEN).map(|i| i as u8).collect();
        wire.write(0xF020, &pattern);
        assert_eq!(wire.take_raised(), Requests::WRITE);
        dispatcher.update(&mut store);
        assert_eq!(&store.mem[0xF020..0xF020 + DEFAULT_MAX_FRAME_LEN], &pattern[..]);
    }

    #[test]
    fn test_register_errors_are_sticky_until_polled() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        store.fail_writes = true;
        store.fail_reads = true;
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.write(0x0010, &[0xDE, 0xAD]);
        dispatcher.update(&mut store);
        assert_eq!(
            wire.status(),
            (StatusFlags::WRITE_COMPLETE | StatusFlags::WRITE_REG_ERROR).bits()
        );
        assert_eq!(wire.status(), 0x00);

        wire.read_init(0x0010, 2);
        dispatcher.update(&mut store);
        assert_eq!(
            wire.status(),
            (StatusFlags::RX_READY | StatusFlags::READ_REG_ERROR).bits()
        );

        // an unpolled error is overwritten by the next access
        wire.write(0x0010, &[0xBE, 0xEF]);
        dispatcher.update(&mut store);
        store.fail_writes = false;
        wire.write(0x0010, &[0xBE, 0xEF]);
        dispatcher.update(&mut store);
        assert_eq!(wire.status(), StatusFlags::WRITE_COMPLETE.bits());
        assert_eq!(&store.mem[0x10..0x12], &[0xBE, 0xEF]);
    }

    #[test]
    fn test_both_requests_in_one_update() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        store.mem[0x3000..0x3004].copy_from_slice(&[0xA1, 0xA2, 0xA3, 0xA4]);
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        // the read-init lands while the write is still pending
        wire.write(0x4000, &[0x11, 0x22]);
        wire.read_init(0x3000, 4);
        assert_eq!(wire.take_raised(), Requests::READ | Requests::WRITE);

        assert_eq!(dispatcher.update(&mut store), Requests::READ | Requests::WRITE);
        assert_eq!(store.writes, vec![(0x4000, vec![0x11, 0x22])]);
        assert_eq!(store.reads, vec![(0x3000, 4)]);
        assert_eq!(&store.mem[0x4000..0x4002], &[0x11, 0x22]);
        assert_eq!(
            wire.status(),
            (StatusFlags::RX_READY | StatusFlags::WRITE_COMPLETE).bits()
        );
        assert_eq!(wire.read_data(4), vec![0xA1, 0xA2, 0xA3, 0xA4]);
    }

    #[test]
    fn test_data_access_without_init() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        {
            let (isr, mut dispatcher) = slave.split();
            let mut wire = Wire::new(isr);

            // nothing has been initialised since reset
            wire.clock(&[0x52, 0xA0, 0x99]);
            assert!(wire.take_raised().is_empty());
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Unarmed));

            wire.write(0x0010, &[0x01]);
            assert_eq!(wire.take_raised(), Requests::WRITE);
            assert_eq!(
                dispatcher.pop_event(),
                Some(FrameEvent::WriteRequested {
                    address: 0x0010,
                    length: 1
                })
            );

            // a rejected init must not reuse the previous length and address
            wire.clock(&init_frame(Opcode::WriteInit, 0, 0x2000));
            wire.clock(&[0x52, 0xA0, 0x77]);
            assert!(wire.take_raised().is_empty());
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::LengthRejected { length: 0 }));
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Unarmed));

            wire.clock(&init_frame(Opcode::ReadInit, 600, 0x0000));
            assert_eq!(wire.clock(&[0x52, 0xA0, 0x00, 0x00]), vec![0; 4]);
            assert!(wire.take_raised().is_empty());
            assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
            assert_eq!(
                dispatcher.pop_event(),
                Some(FrameEvent::LengthRejected { length: 600 })
            );
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Unarmed));

            assert_eq!(dispatcher.update(&mut store), Requests::WRITE);
            assert_eq!(dispatcher.update(&mut store), Requests::empty());
        }

        assert_eq!(store.writes, vec![(0x0010, vec![0x01])]);
        assert!(store.reads.is_empty());
        assert!(!slave.armed());
        assert_eq!(slave.direction(), Direction::Read);
    }

    #[test]
    fn test_repeated_data_phase_reuses_init() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.write(0x0020, &[1, 2]);
        dispatcher.update(&mut store);

        wire.clock(&data_header(2));
        wire.clock(&[3, 4]);
        assert_eq!(wire.take_raised(), Requests::WRITE);
        dispatcher.update(&mut store);

        assert_eq!(
            store.writes,
            vec![(0x0020, vec![1, 2]), (0x0020, vec![3, 4])]
        );
    }

    #[test]
    fn test_bad_control_bytes_are_ignored() {
        let mut slave: Slave = Slave::new();
        {
            let (isr, _dispatcher) = slave.split();
            let mut wire = Wire::new(isr);
            assert_eq!(wire.clock(&[0x00, 0xA0, 0xFF, 0x12, 0x34]), vec![0; 5]);
            assert!(wire.take_raised().is_empty());
            assert_eq!(wire.isr.state(), RxState::AwaitControl);
        }
        assert!(slave.pending().is_empty());
        assert!(slave.peek_status().is_empty());
    }

    #[test]
    fn test_sync_mismatch_resyncs() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        // control byte followed by a second control byte instead of sync
        wire.clock(&[0x51, 0x51]);
        assert_eq!(wire.isr.state(), RxState::AwaitControl);
        assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Desync { byte: 0x51 }));

        // a status poll with a bad sync byte falls back to idle
        wire.clock(&[0x53, 0x00, 0x00]);
        assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
        assert!(wire.take_raised().is_empty());

        // the next well-formed frame goes through
        wire.write(0x0042, &[0x99]);
        assert_eq!(dispatcher.update(&mut store), Requests::WRITE);
        assert_eq!(store.writes, vec![(0x0042, vec![0x99])]);
    }

    #[test]
    fn test_bad_sync_after_write_data_access() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        {
            let (isr, mut dispatcher) = slave.split();
            let mut wire = Wire::new(isr);

            wire.clock(&init_frame(Opcode::WriteInit, 2, 0x0500));
            wire.clock(&[0x52, 0x00]);
            assert!(wire.take_raised().is_empty());
            assert_eq!(wire.isr.state(), RxState::AwaitControl);
            assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Desync { byte: 0x00 }));

            // payload bytes of the dropped frame are not collected
            wire.clock(&[0xAA, 0xBB]);
            assert!(wire.take_raised().is_empty());

            wire.write(0x0500, &[0x12, 0x34]);
            assert_eq!(wire.take_raised(), Requests::WRITE);
            assert_eq!(dispatcher.update(&mut store), Requests::WRITE);
        }

        assert_eq!(store.writes, vec![(0x0500, vec![0x12, 0x34])]);
        assert_eq!(&store.mem[0x0500..0x0502], &[0x12, 0x34]);
        assert!(slave.pending().is_empty());
    }

    #[test]
    fn test_bad_sync_after_read_data_access() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        store.mem[0x0600..0x0603].copy_from_slice(&[0x0A, 0x0B, 0x0C]);
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.read_init(0x0600, 3);
        assert_eq!(wire.take_raised(), Requests::READ);
        assert_eq!(dispatcher.update(&mut store), Requests::READ);

        wire.clock(&[0x52, 0x33]);
        assert!(wire.take_raised().is_empty());
        assert_eq!(wire.isr.state(), RxState::AwaitControl);
        assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
        assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Desync { byte: 0x33 }));

        // the next data phase starts from the first payload byte again
        assert_eq!(wire.read_data(3), vec![0x0A, 0x0B, 0x0C]);
        assert_eq!(wire.isr.tx_mode(), TxMode::Idle);
        assert_eq!(store.reads, vec![(0x0600, 3)]);
    }

    #[test]
    fn test_length_out_of_range() {
        let mut slave: Slave = Slave::new();
        {
            let (isr, mut dispatcher) = slave.split();
            let mut wire = Wire::new(isr);

            wire.clock(&init_frame(Opcode::ReadInit, 0, 0x1234));
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::LengthRejected { length: 0 }));

            wire.clock(&init_frame(Opcode::ReadInit, 513, 0x1234));
            assert_eq!(
                dispatcher.pop_event(),
                Some(FrameEvent::LengthRejected { length: 513 })
            );

            assert!(wire.take_raised().is_empty());
            assert_eq!(wire.isr.state(), RxState::AwaitControl);
        }
        assert!(slave.pending().is_empty());
    }

    #[test]
    fn test_small_buffer_bounds_length() {
        let mut slave: Slave<8> = Slave::new();
        assert_eq!(slave.max_frame_len(), 8);
        let (isr, _dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.clock(&init_frame(Opcode::ReadInit, 9, 0));
        assert!(wire.take_raised().is_empty());
        wire.clock(&init_frame(Opcode::ReadInit, 8, 0));
        assert_eq!(wire.take_raised(), Requests::READ);
    }

    #[test]
    fn test_combined_rx_and_tx() {
        let mut slave: Slave = Slave::new();
        let (mut isr, _dispatcher) = slave.split();

        let out = isr.on_interrupt(IrqStatus::received(0x53));
        assert_eq!(out.tx, None);
        assert_eq!(isr.tx_mode(), TxMode::Status);

        // the transmit byte reflects the state reached by the received one
        let out = isr.on_interrupt(IrqStatus::received(0xA0).with_tx_ready());
        assert_eq!(out.tx, Some(0x00));
        assert_eq!(isr.state(), RxState::AwaitStatusSent);
        assert_eq!(isr.tx_mode(), TxMode::Idle);
    }

    #[test]
    fn test_hardware_errors_latched() {
        let mut slave: Slave = Slave::new();
        {
            let (isr, mut dispatcher) = slave.split();
            let mut wire = Wire::new(isr);

            let out = wire
                .isr
                .on_interrupt(IrqStatus::default().with_overrun().with_underrun());
            assert_eq!(out, IsrOutcome::default());
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Overrun));
            assert_eq!(dispatcher.pop_event(), Some(FrameEvent::Underrun));

            assert_eq!(wire.status(), StatusFlags::TRANSPORT_ERROR.bits());
            assert_eq!(wire.status(), 0x00);
        }
        assert!(slave.peek_status().is_empty());
    }

    #[test]
    fn test_service_masks_around_handler() {
        let mut slave: Slave = Slave::new();
        let (mut isr, _dispatcher) = slave.split();
        let mut gate = Gate::default();

        for &byte in &status_frame() {
            isr.service(&mut gate, IrqStatus::received(byte).with_tx_ready());
        }
        assert_eq!(gate.masks, 3);
        assert_eq!(gate.unmasks, 3);
        assert!(!gate.masked);
    }

    #[test]
    fn test_events_in_order() {
        let mut slave: Slave = Slave::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        wire.write(0x1234, &[0xAA]);
        wire.read_init(0x1234, 1);
        wire.read_data(1);
        wire.status();

        assert_eq!(
            dispatcher.pop_event(),
            Some(FrameEvent::WriteRequested {
                address: 0x1234,
                length: 1
            })
        );
        assert_eq!(
            dispatcher.pop_event(),
            Some(FrameEvent::ReadRequested {
                address: 0x1234,
                length: 1
            })
        );
        assert_eq!(dispatcher.pop_event(), Some(FrameEvent::ReadDrained));
        assert_eq!(
            dispatcher.pop_event(),
            Some(FrameEvent::StatusLatched(StatusFlags::empty()))
        );
        assert_eq!(dispatcher.pop_event(), None);
        assert_eq!(dispatcher.dropped_events(), 0);
    }

    #[test]
    fn test_full_event_queue_counts_drops() {
        let mut slave: Slave = Slave::new();
        let (isr, mut dispatcher) = slave.split();
        let mut wire = Wire::new(isr);

        for _ in 0..20 {
            wire.clock(&[0x50, 0x00]);
        }
        // one slot of the queue is always kept free
        assert_eq!(dispatcher.dropped_events(), 20 - (EVENT_QUEUE_LEN as u16 - 1));

        let mut store = Store::new();
        dispatcher.update(&mut store);
        assert_eq!(dispatcher.pop_event(), None);
    }

    #[test]
    fn test_resplit_keeps_state() {
        let mut slave: Slave = Slave::new();
        let mut store = Store::new();
        {
            let (isr, _dispatcher) = slave.split();
            Wire::new(isr).write(0x0001, &[5, 6]);
        }
        assert_eq!(slave.pending(), Requests::WRITE);
        assert_eq!(slave.direction(), Direction::Write);

        let (_isr, mut dispatcher) = slave.split();
        assert_eq!(dispatcher.update(&mut store), Requests::WRITE);
        assert_eq!(&store.mem[1..3], &[5, 6]);
    }
}
