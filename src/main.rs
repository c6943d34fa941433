//! spireg - Register access over a framed SPI link
//!
//! Talks to an SPI slave that exposes a 16-bit register map through the
//! spireg framing protocol. Each read or write is split into an init frame,
//! status polls and a data frame; see `spireg_core` for the wire format.
//!
//! The bus is chosen with `-p`: `linux_spi` drives real hardware through
//! spidev, `sim` runs the slave state machine in-process against an
//! in-memory register map.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use spireg_core::master::{ClientConfig, FullDuplex, RegClient};

fn open_client(
    programmer: &str,
    max_frame_len: usize,
) -> Result<RegClient<programmers::Bus>, Box<dyn std::error::Error>> {
    let bus = programmers::open_bus(programmer)?;
    log::debug!(
        "Bus ready (max transfer {} bytes, frame size {} bytes)",
        bus.max_transfer_len(),
        max_frame_len
    );
    let config = ClientConfig::default().with_max_frame_len(max_frame_len);
    Ok(RegClient::with_config(bus, config))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let max_frame_len = cli.max_frame_len;

    match cli.command {
        Commands::Status { programmer } => {
            let mut client = open_client(&programmer, max_frame_len)?;
            commands::regs::cmd_status(&mut client)
        }
        Commands::Read {
            programmer,
            addr,
            len,
            output,
        } => {
            let mut client = open_client(&programmer, max_frame_len)?;
            commands::regs::cmd_read(&mut client, addr, len, output.as_deref())
        }
        Commands::Write {
            programmer,
            addr,
            data,
            input,
            verify,
        } => {
            let mut client = open_client(&programmer, max_frame_len)?;
            commands::regs::cmd_write(
                &mut client,
                addr,
                data.map(|d| d.0),
                input.as_deref(),
                verify,
            )
        }
        Commands::Resync { programmer, unsync } => {
            let mut client = open_client(&programmer, max_frame_len)?;
            commands::regs::cmd_resync(&mut client, unsync)
        }
        Commands::Stress {
            programmer,
            iterations,
            no_resync,
        } => {
            let mut client = open_client(&programmer, max_frame_len)?;
            commands::stress::cmd_stress(&mut client, iterations, !no_resync)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}
