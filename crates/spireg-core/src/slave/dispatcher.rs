//! Deferred request dispatcher (main context)

use core::sync::atomic::Ordering;

use heapless::spsc::Consumer;

use crate::regs::RegisterMap;

use super::events::{FrameEvent, EVENT_QUEUE_LEN};
use super::mailbox::Mailbox;
use super::Requests;

/// Main-context half of a [`Slave`](super::Slave)
///
/// Call [`Dispatcher::update`] from the application's main loop. It must
/// never be called from the interrupt handler.
pub struct Dispatcher<'a, const N: usize> {
    mailbox: &'a Mailbox<N>,
    scratch: &'a mut [u8; N],
    events: Consumer<'a, FrameEvent, EVENT_QUEUE_LEN>,
}

impl<'a, const N: usize> Dispatcher<'a, N> {
    pub(crate) fn new(
        mailbox: &'a Mailbox<N>,
        scratch: &'a mut [u8; N],
        events: Consumer<'a, FrameEvent, EVENT_QUEUE_LEN>,
    ) -> Self {
        Self {
            mailbox,
            scratch,
            events,
        }
    }

    /// Service pending read and write requests against `regs`
    ///
    /// Queued diagnostic events are drained and logged first.
    ///
    /// The write and the read share one payload buffer. A write's data sits
    /// in that buffer until it is copied out here, and a read overwrites it
    /// with register contents. When both are pending, the write is copied
    /// out and committed first, so the read cannot replace the payload the
    /// master sent before it reaches the register map.
    ///
    /// Each request is consumed before the register map is called, so a
    /// request raised while the access runs is kept for the next call.
    /// Returns the requests that were serviced.
    pub fn update<R: RegisterMap + ?Sized>(&mut self, regs: &mut R) -> Requests {
        while let Some(event) = self.events.dequeue() {
            log::debug!("spi slave: {}", event);
        }

        let mut serviced = Requests::empty();

        if let Some((length, address)) = self.mailbox.take_write() {
            let data = &mut self.scratch[..usize::from(length)];
            self.mailbox.copy_out(data);
            let result = regs.write(address, data);
            if let Err(e) = result {
                log::warn!(
                    "spi slave: write of {} bytes at 0x{:04X} failed: {}",
                    length,
                    address,
                    e
                );
            }
            self.mailbox.complete_write(result.is_err());
            serviced |= Requests::WRITE;
        }

        if let Some((length, address)) = self.mailbox.take_read() {
            let buf = &mut self.scratch[..usize::from(length)];
            let result = regs.read(address, buf);
            match result {
                Ok(()) => self.mailbox.copy_in(buf),
                Err(e) => log::warn!(
                    "spi slave: read of {} bytes at 0x{:04X} failed: {}",
                    length,
                    address,
                    e
                ),
            }
            self.mailbox.complete_read(result.is_err());
            serviced |= Requests::READ;
        }

        serviced
    }

    /// Take the oldest diagnostic event, if any
    ///
    /// Applications that want to handle events themselves should call this
    /// before [`Dispatcher::update`], which drains whatever is left.
    pub fn pop_event(&mut self) -> Option<FrameEvent> {
        self.events.dequeue()
    }

    /// Number of events lost because the queue was full
    pub fn dropped_events(&self) -> u16 {
        self.mailbox.dropped_events.load(Ordering::Relaxed)
    }
}
