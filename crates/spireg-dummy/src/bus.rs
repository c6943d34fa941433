//! Simulated SPI bus with a slave on the other end
//!
//! [`SimulatedSlave`] runs the real slave state machine from `spireg-core`
//! and clocks every byte through it the way full-duplex SPI hardware does:
//! transmit-empty fires when the previously loaded byte moves into the
//! shift register, receive-full fires once the byte has been shifted in.

use spireg_core::error::{Error as CoreError, Result as CoreResult};
use spireg_core::master::FullDuplex;
use spireg_core::protocol::DEFAULT_MAX_FRAME_LEN;
use spireg_core::slave::{IrqStatus, Requests, Slave};
use spireg_core::RegisterMap;

/// Default transfer limit, matching a typical spidev buffer
pub const DEFAULT_MAX_TRANSFER_LEN: usize = 4096;

/// When the slave's main loop runs the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// After every transfer, like a main loop that is always ahead of the
    /// master
    #[default]
    AfterTransfer,
    /// Only when [`SimulatedSlave::dispatch`] is called
    Manual,
}

/// In-process slave reachable through [`FullDuplex`]
pub struct SimulatedSlave<R, const N: usize = DEFAULT_MAX_FRAME_LEN> {
    slave: Box<Slave<N>>,
    regs: R,
    mode: DispatchMode,
    max_transfer_len: usize,
    /// Byte waiting in the transmit data register
    tdr: u8,
    overrun: bool,
    underrun: bool,
    bytes_clocked: u64,
}

impl<R: RegisterMap> SimulatedSlave<R> {
    /// Create a simulated slave with the default payload buffer serving
    /// `regs`
    pub fn new(regs: R) -> Self {
        Self::with_capacity(regs)
    }
}

impl<R: RegisterMap, const N: usize> SimulatedSlave<R, N> {
    /// Create a simulated slave with an `N`-byte payload buffer serving
    /// `regs`
    pub fn with_capacity(regs: R) -> Self {
        Self {
            slave: Box::new(Slave::new()),
            regs,
            mode: DispatchMode::default(),
            max_transfer_len: DEFAULT_MAX_TRANSFER_LEN,
            tdr: 0,
            overrun: false,
            underrun: false,
            bytes_clocked: 0,
        }
    }

    /// Set when the dispatcher runs
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the largest transfer the bus accepts
    pub fn with_max_transfer_len(mut self, len: usize) -> Self {
        self.max_transfer_len = len;
        self
    }

    /// Run the slave's dispatcher once
    pub fn dispatch(&mut self) -> Requests {
        let (_isr, mut dispatcher) = self.slave.split();
        let serviced = dispatcher.update(&mut self.regs);
        let dropped = dispatcher.dropped_events();
        if dropped > 0 {
            log::trace!("sim: {} slave events dropped so far", dropped);
        }
        serviced
    }

    /// Report a receive overrun with the next received byte
    pub fn inject_overrun(&mut self) {
        self.overrun = true;
    }

    /// Report a transmit underrun with the next received byte
    pub fn inject_underrun(&mut self) {
        self.underrun = true;
    }

    /// The slave state machine
    pub fn slave(&self) -> &Slave<N> {
        &self.slave
    }

    /// The register map
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Mutable access to the register map
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Give the register map back
    pub fn into_regs(self) -> R {
        self.regs
    }

    /// Total bytes clocked since creation
    pub fn bytes_clocked(&self) -> u64 {
        self.bytes_clocked
    }
}

impl<R: RegisterMap, const N: usize> FullDuplex for SimulatedSlave<R, N> {
    fn max_transfer_len(&self) -> usize {
        self.max_transfer_len
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> CoreResult<()> {
        if tx.len() != rx.len() {
            return Err(CoreError::TransferFailed);
        }
        if tx.len() > self.max_transfer_len {
            return Err(CoreError::FrameTooLarge);
        }

        {
            let (mut isr, _dispatcher) = self.slave.split();
            for (&mosi, miso) in tx.iter().zip(rx.iter_mut()) {
                *miso = self.tdr;
                if let Some(next) = isr.on_interrupt(IrqStatus::tx_ready()).tx {
                    self.tdr = next;
                }

                let mut status = IrqStatus::received(mosi);
                if std::mem::take(&mut self.overrun) {
                    status = status.with_overrun();
                }
                if std::mem::take(&mut self.underrun) {
                    status = status.with_underrun();
                }
                isr.on_interrupt(status);
            }
        }
        self.bytes_clocked += tx.len() as u64;
        log::trace!("sim: {:02X?} -> {:02X?}", tx, rx);

        if self.mode == DispatchMode::AfterTransfer {
            self.dispatch();
        }
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // The simulated slave has no clock; time only passes between transfers
    }
}
