//! Register access commands

use indicatif::{ProgressBar, ProgressStyle};
use spireg_core::master::{FullDuplex, RegClient};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use super::{compare, frames, CommandError};

/// Bytes per hex dump line
const DUMP_WIDTH: usize = 16;

/// Progress bar for multi-frame accesses, hidden for a single frame
fn progress(total: usize, max_frame_len: usize) -> ProgressBar {
    if total <= max_frame_len {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Format `data` as lines of `address: bytes`
pub fn hex_dump(address: u16, data: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in data.chunks(DUMP_WIDTH).enumerate() {
        let line_addr = u32::from(address) + (i * DUMP_WIDTH) as u32;
        let bytes: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        out.push_str(&format!("0x{:04X}: {}\n", line_addr, bytes.join(" ")));
    }
    out
}

/// Print the slave's status byte (reading it clears it)
pub fn cmd_status<B: FullDuplex>(
    client: &mut RegClient<B>,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = client.status()?;
    println!("Status: {}", status);
    Ok(())
}

/// Read `len` bytes at `address`, one frame at a time
pub fn read_range<B: FullDuplex>(
    client: &mut RegClient<B>,
    address: u16,
    len: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let max_frame_len = client.config().max_frame_len;
    let mut data = vec![0u8; len];

    let pb = progress(len, max_frame_len);
    for (frame_addr, offset, frame_len) in frames(address, len, max_frame_len)? {
        client.read(frame_addr, &mut data[offset..offset + frame_len])?;
        pb.set_position((offset + frame_len) as u64);
    }
    pb.finish_and_clear();

    Ok(data)
}

/// Write `data` at `address`, one frame at a time
pub fn write_range<B: FullDuplex>(
    client: &mut RegClient<B>,
    address: u16,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let max_frame_len = client.config().max_frame_len;

    let pb = progress(data.len(), max_frame_len);
    for (frame_addr, offset, frame_len) in frames(address, data.len(), max_frame_len)? {
        client.write(frame_addr, &data[offset..offset + frame_len])?;
        pb.set_position((offset + frame_len) as u64);
    }
    pb.finish_and_clear();

    Ok(())
}

/// Run the read command
pub fn cmd_read<B: FullDuplex>(
    client: &mut RegClient<B>,
    address: u16,
    len: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_range(client, address, len)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => print!("{}", hex_dump(address, &data)),
    }
    Ok(())
}

/// Run the write command
///
/// Data comes from `data` or else from the file at `input`.
pub fn cmd_write<B: FullDuplex>(
    client: &mut RegClient<B>,
    address: u16,
    data: Option<Vec<u8>>,
    input: Option<&Path>,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = match (data, input) {
        (Some(data), _) => data,
        (None, Some(path)) => {
            let mut file = File::open(path)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            println!("Read {} bytes from {:?}", data.len(), path);
            data
        }
        (None, None) => return Err(CommandError::NoData.into()),
    };

    write_range(client, address, &data)?;
    println!("Wrote {} bytes at 0x{:04X}", data.len(), address);

    if verify {
        let found = read_range(client, address, data.len())?;
        compare(address, &data, &found)?;
        println!("Verification passed!");
    }
    Ok(())
}

/// Run the resync command
pub fn cmd_resync<B: FullDuplex>(
    client: &mut RegClient<B>,
    unsync: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if unsync {
        client.unsync()?;
        println!("Left the slave inside a truncated read");
    }
    let discarded = client.resync()?;
    println!("Resynchronized, discarded status {}", discarded);
    Ok(())
}
