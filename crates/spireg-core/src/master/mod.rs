//! Host side of the protocol
//!
//! [`RegClient`] drives read, write and status transactions over any
//! [`FullDuplex`] bus, with the retry and polling behavior a master needs
//! to cope with a slave that services requests from its main loop.

mod client;
mod traits;

pub use client::{ClientConfig, RegClient};
pub use traits::FullDuplex;
