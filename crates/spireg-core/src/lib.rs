//! spireg-core - Framed register access over a full-duplex SPI link
//!
//! This crate implements both ends of a small byte-oriented protocol that
//! lets an SPI master read and write ranges of a register map exposed by an
//! SPI slave. It is `no_std` compatible so the slave half can run inside an
//! interrupt handler on a microcontroller.
//!
//! # Layout
//!
//! - [`protocol`] - wire constants, opcodes and frame encoding
//! - [`status`] - the read-and-clear status byte
//! - [`regs`] - the [`RegisterMap`] capability the slave dispatches into
//! - [`slave`] - frame decoder, transmit sequencer and deferred dispatcher
//! - `master` - host client driving transactions over a [`master::FullDuplex`]
//!   bus (requires `alloc`)
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable the host-side client
//! - `is_sync` - Compile the client and bus traits as blocking code
//!
//! # Example
//!
//! ```ignore
//! use spireg_core::slave::{IrqStatus, Slave};
//!
//! let mut slave: Slave = Slave::new();
//! let (mut isr, mut dispatcher) = slave.split();
//!
//! // interrupt context
//! let out = isr.on_interrupt(IrqStatus::received(0x53).with_tx_ready());
//!
//! // main loop
//! dispatcher.update(&mut my_registers);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
#[cfg(feature = "alloc")]
pub mod master;
pub mod protocol;
pub mod regs;
pub mod slave;
pub mod status;

pub use error::{Error, Result};
pub use regs::{AccessError, RegisterMap};
pub use status::StatusFlags;
