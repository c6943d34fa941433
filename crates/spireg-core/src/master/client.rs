//! Register access client
//!
//! Every operation is split in the phases the slave expects: an init frame
//! announcing the address and length, status polls until the slave's main
//! loop has serviced the request, and a data frame. Receive overruns and
//! transmit underruns reported by the slave make the affected phase repeat;
//! register errors are final.

use alloc::vec::Vec;

use maybe_async::maybe_async;

use crate::error::{Error, Result};
use crate::protocol::{
    data_header, init_frame, status_frame, Opcode, DATA_HEADER_LEN, DEFAULT_MAX_FRAME_LEN,
    MAX_WIRE_LEN,
};
use crate::status::StatusFlags;

use super::traits::FullDuplex;

/// Length and address of the frame sent by [`RegClient::unsync`]
const UNSYNC_LEN: u16 = 10;
const UNSYNC_ADDR: u16 = 0x1000;

/// Client tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Payload buffer size of the slave
    pub max_frame_len: usize,
    /// Status polls to wait for a completion bit before giving up
    pub poll_attempts: u32,
    /// Delay between two status polls
    pub poll_interval_us: u32,
    /// Times a phase is repeated after a transport error
    pub retries: u32,
    /// Delay after the resync burst before the status is cleared
    pub resync_settle_us: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            poll_attempts: 1000,
            poll_interval_us: 1000,
            retries: 8,
            resync_settle_us: 10_000,
        }
    }
}

impl ClientConfig {
    /// Set the slave's payload buffer size
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Set the number of status polls per completion wait
    pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_attempts = attempts;
        self
    }

    /// Set the delay between status polls
    pub fn with_poll_interval_us(mut self, us: u32) -> Self {
        self.poll_interval_us = us;
        self
    }

    /// Set the number of repeats after a transport error
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the delay after a resync burst
    pub fn with_resync_settle_us(mut self, us: u32) -> Self {
        self.resync_settle_us = us;
        self
    }
}

/// Outcome of waiting for a completion bit
struct Poll {
    done: bool,
    transport_error: bool,
    register_error: bool,
}

/// Register access client for a slave on `B`
pub struct RegClient<B> {
    bus: B,
    config: ClientConfig,
    tx: Vec<u8>,
    rx: Vec<u8>,
}

impl<B: FullDuplex> RegClient<B> {
    /// Create a client with the default configuration
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, ClientConfig::default())
    }

    /// Create a client with `config`
    pub fn with_config(bus: B, config: ClientConfig) -> Self {
        Self {
            bus,
            config,
            tx: Vec::new(),
            rx: Vec::new(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared access to the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn into_inner(self) -> B {
        self.bus
    }

    fn frame_length(&self, len: usize) -> Result<u16> {
        if len == 0 || len > self.config.max_frame_len || len > usize::from(MAX_WIRE_LEN) {
            return Err(Error::InvalidLength);
        }
        Ok(len as u16)
    }

    /// Clock out `self.tx`, capturing the reply in `self.rx`
    #[maybe_async]
    async fn exchange(&mut self) -> Result<()> {
        if self.tx.len() > self.bus.max_transfer_len() {
            return Err(Error::FrameTooLarge);
        }
        self.rx.clear();
        self.rx.resize(self.tx.len(), 0);
        self.bus.transfer(&self.tx, &mut self.rx).await
    }

    #[maybe_async]
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.tx.clear();
        self.tx.extend_from_slice(frame);
        self.exchange().await
    }

    /// Poll the slave's status byte
    ///
    /// Reading the status clears it on the slave. Transport and register
    /// error bits are logged.
    #[maybe_async]
    pub async fn status(&mut self) -> Result<StatusFlags> {
        self.send(&status_frame()).await?;
        let status = StatusFlags::from_bits_truncate(self.rx[2]);

        if status.contains(StatusFlags::RX_OVERRUN) {
            log::warn!("slave reported a receive overrun");
        }
        if status.contains(StatusFlags::TX_UNDERRUN) {
            log::warn!("slave reported a transmit underrun");
        }
        if status.contains(StatusFlags::WRITE_REG_ERROR) {
            log::warn!("slave reported a register write error");
        }
        if status.contains(StatusFlags::READ_REG_ERROR) {
            log::warn!("slave reported a register read error");
        }
        log::trace!("status: {}", status);

        Ok(status)
    }

    /// Poll until `done` is reported, a transport error shows up or the
    /// poll budget runs out. `first` is the status already read.
    #[maybe_async]
    async fn wait_for(&mut self, done: StatusFlags, error: StatusFlags, first: StatusFlags) -> Result<Poll> {
        let mut poll = Poll {
            done: first.contains(done),
            transport_error: first.has_transport_error(),
            register_error: first.intersects(error),
        };

        let mut attempts = 0;
        while !poll.done && !poll.transport_error {
            if attempts == self.config.poll_attempts {
                return Err(Error::Timeout);
            }
            attempts += 1;
            self.bus.delay_us(self.config.poll_interval_us).await;

            let status = self.status().await?;
            poll.done = status.contains(done);
            poll.transport_error |= status.has_transport_error();
            poll.register_error |= status.intersects(error);
        }

        if attempts > 0 {
            log::debug!("slave answered after {} polls", attempts);
        }
        Ok(poll)
    }

    /// Write `data` at `address`
    ///
    /// Returns [`Error::WriteRegister`] if the slave's register map
    /// rejected the write.
    #[maybe_async]
    pub async fn write(&mut self, address: u16, data: &[u8]) -> Result<()> {
        let length = self.frame_length(data.len())?;
        log::debug!("write {} bytes at 0x{:04X}", length, address);

        let init = init_frame(Opcode::WriteInit, length, address);
        let mut attempt = 0;
        loop {
            self.send(&init).await?;
            if !self.status().await?.has_transport_error() {
                break;
            }
            attempt += 1;
            if attempt > self.config.retries {
                return Err(Error::TransportFault);
            }
            log::warn!("write-init hit a transport error, repeating");
        }

        for _ in 0..=self.config.retries {
            self.tx.clear();
            self.tx.extend_from_slice(&data_header(length));
            self.tx.extend_from_slice(data);
            self.exchange().await?;

            let first = self.status().await?;
            let poll = self
                .wait_for(StatusFlags::WRITE_COMPLETE, StatusFlags::WRITE_REG_ERROR, first)
                .await?;

            if poll.register_error {
                return Err(Error::WriteRegister);
            }
            if !poll.transport_error {
                return Ok(());
            }
            log::warn!("write data phase hit a transport error, repeating");
        }

        Err(Error::TransportFault)
    }

    /// Read `buf.len()` bytes at `address` into `buf`
    ///
    /// Returns [`Error::ReadRegister`] if the slave's register map
    /// rejected the read.
    #[maybe_async]
    pub async fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<()> {
        let length = self.frame_length(buf.len())?;
        log::debug!("read {} bytes at 0x{:04X}", length, address);

        let init = init_frame(Opcode::ReadInit, length, address);
        let mut attempt = 0;
        loop {
            self.send(&init).await?;
            let first = self.status().await?;
            let poll = self
                .wait_for(StatusFlags::RX_READY, StatusFlags::READ_REG_ERROR, first)
                .await?;

            if poll.register_error {
                return Err(Error::ReadRegister);
            }
            if !poll.transport_error {
                break;
            }
            attempt += 1;
            if attempt > self.config.retries {
                return Err(Error::TransportFault);
            }
            log::warn!("read-init hit a transport error, repeating");
        }

        for _ in 0..=self.config.retries {
            self.tx.clear();
            self.tx.extend_from_slice(&data_header(length));
            self.tx.resize(DATA_HEADER_LEN + buf.len(), 0);
            self.exchange().await?;

            // keep the data before the status poll reuses the buffers
            buf.copy_from_slice(&self.rx[DATA_HEADER_LEN..]);

            if !self.status().await?.has_transport_error() {
                return Ok(());
            }
            log::warn!("read data phase hit a transport error, repeating");
        }

        Err(Error::TransportFault)
    }

    /// Bring a desynchronized slave back to waiting for a control byte
    ///
    /// Clocks enough filler bytes to run any frame in progress to its end,
    /// gives the slave time to service whatever request that produced, then
    /// reads and returns the status to clear it. A write in progress is
    /// completed with filler bytes.
    #[maybe_async]
    pub async fn resync(&mut self) -> Result<StatusFlags> {
        let mut remaining = self.config.max_frame_len + DATA_HEADER_LEN;
        let chunk = self.bus.max_transfer_len().max(1);
        log::debug!("resync: clocking {} filler bytes", remaining);

        while remaining > 0 {
            let n = remaining.min(chunk);
            self.tx.clear();
            self.tx.resize(n, 0);
            self.exchange().await?;
            remaining -= n;
        }

        self.bus.delay_us(self.config.resync_settle_us).await;
        let status = self.status().await?;
        log::debug!("resync: discarded status {}", status);
        Ok(status)
    }

    /// Leave the slave stuck in the middle of a read-data frame
    ///
    /// Sends a read-init followed by a data phase that is cut short. This
    /// is a debugging aid for exercising [`RegClient::resync`].
    #[maybe_async]
    pub async fn unsync(&mut self) -> Result<()> {
        log::debug!("unsync: truncating a {} byte read", UNSYNC_LEN);
        self.send(&init_frame(Opcode::ReadInit, UNSYNC_LEN, UNSYNC_ADDR))
            .await?;

        self.tx.clear();
        self.tx.extend_from_slice(&data_header(UNSYNC_LEN));
        self.tx.extend_from_slice(&[0, 0]);
        self.exchange().await
    }
}
