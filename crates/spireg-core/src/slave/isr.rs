//! Interrupt entry point
//!
//! The embedding firmware reads its peripheral status register, builds an
//! [`IrqStatus`] snapshot and passes it to [`SlaveIsr::on_interrupt`] (or
//! [`SlaveIsr::service`] to have the interrupt source masked around the
//! call). The returned [`IsrOutcome`] says what to load into the transmit
//! data register.

use super::decoder::{Decoder, RxState, TxMode};
use super::events::{EventTx, FrameEvent};
use super::mailbox::Mailbox;
use super::Requests;

/// Snapshot of the SPI peripheral's interrupt status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IrqStatus {
    /// Byte pulled from the receive data register, if it was full
    pub received: Option<u8>,
    /// The transmit data register is empty and wants a byte
    pub tx_ready: bool,
    /// The peripheral flagged a receive overrun
    pub overrun: bool,
    /// The peripheral flagged a transmit underrun
    pub underrun: bool,
}

impl IrqStatus {
    /// Receive-full with `byte`
    pub const fn received(byte: u8) -> Self {
        Self {
            received: Some(byte),
            tx_ready: false,
            overrun: false,
            underrun: false,
        }
    }

    /// Transmit-empty only
    pub const fn tx_ready() -> Self {
        Self {
            received: None,
            tx_ready: true,
            overrun: false,
            underrun: false,
        }
    }

    /// Also report transmit-empty
    pub const fn with_tx_ready(mut self) -> Self {
        self.tx_ready = true;
        self
    }

    /// Also report a receive overrun
    pub const fn with_overrun(mut self) -> Self {
        self.overrun = true;
        self
    }

    /// Also report a transmit underrun
    pub const fn with_underrun(mut self) -> Self {
        self.underrun = true;
        self
    }
}

/// Result of one interrupt invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsrOutcome {
    /// Byte to write to the transmit data register (present iff the
    /// snapshot reported transmit-empty)
    pub tx: Option<u8>,
    /// Requests raised for the dispatcher during this invocation
    pub raised: Requests,
}

/// Masks and unmasks the slave's own interrupt source
///
/// Implemented by the embedding firmware on top of its interrupt
/// controller.
pub trait IrqGate {
    /// Stop the SPI interrupt from firing
    fn mask(&mut self);
    /// Allow the SPI interrupt to fire again
    fn unmask(&mut self);
}

/// Keeps an [`IrqGate`] masked until dropped
struct Masked<'g, G: IrqGate + ?Sized> {
    gate: &'g mut G,
}

impl<'g, G: IrqGate + ?Sized> Masked<'g, G> {
    fn new(gate: &'g mut G) -> Self {
        gate.mask();
        Self { gate }
    }
}

impl<G: IrqGate + ?Sized> Drop for Masked<'_, G> {
    fn drop(&mut self) {
        self.gate.unmask();
    }
}

/// Interrupt-context half of a [`Slave`](super::Slave)
pub struct SlaveIsr<'a, const N: usize> {
    decoder: &'a mut Decoder,
    mailbox: &'a Mailbox<N>,
    events: EventTx<'a>,
}

impl<'a, const N: usize> SlaveIsr<'a, N> {
    pub(crate) fn new(decoder: &'a mut Decoder, mailbox: &'a Mailbox<N>, events: EventTx<'a>) -> Self {
        Self {
            decoder,
            mailbox,
            events,
        }
    }

    /// Handle one interrupt
    ///
    /// Hardware errors are latched first, then the received byte is
    /// decoded, then the transmit byte is produced. Receive and transmit
    /// events may arrive together; the transmit byte then already reflects
    /// the state reached by the received one.
    pub fn on_interrupt(&mut self, status: IrqStatus) -> IsrOutcome {
        if status.overrun {
            self.mailbox.latch_overrun();
            self.events.record(FrameEvent::Overrun);
        }
        if status.underrun {
            self.mailbox.latch_underrun();
            self.events.record(FrameEvent::Underrun);
        }

        let mut raised = Requests::empty();
        if let Some(byte) = status.received {
            raised |= self.decoder.receive(byte, self.mailbox, &mut self.events);
        }

        let tx = status.tx_ready.then(|| self.decoder.next_tx(self.mailbox));

        IsrOutcome { tx, raised }
    }

    /// Handle one interrupt with the source masked for the duration
    pub fn service<G: IrqGate + ?Sized>(&mut self, gate: &mut G, status: IrqStatus) -> IsrOutcome {
        let _masked = Masked::new(gate);
        self.on_interrupt(status)
    }

    /// Current decoder state
    pub fn state(&self) -> RxState {
        self.decoder.state()
    }

    /// Current transmit mode
    pub fn tx_mode(&self) -> TxMode {
        self.decoder.tx_mode()
    }
}
