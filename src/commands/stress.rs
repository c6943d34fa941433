//! Soak test: write two patterns, read them back and compare, in a loop
//!
//! The first pattern fills one frame at `0x1000` with `0..=255` repeated,
//! the second is five bytes counting down from `0xFF` at `0xF020`. The
//! first byte of each changes every loop so stale data is caught.

use indicatif::{ProgressBar, ProgressStyle};
use spireg_core::master::{FullDuplex, RegClient};
use std::time::Instant;

use super::compare;

const PATTERN1_ADDR: u16 = 0x1000;
const PATTERN2_ADDR: u16 = 0xF020;
const PATTERN2_LEN: usize = 5;

/// Totals of a stress run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressStats {
    /// Loops completed
    pub loops: u32,
    /// Payload bytes written plus bytes read back
    pub bytes: u64,
}

fn patterns(max_frame_len: usize) -> (Vec<u8>, Vec<u8>) {
    let pattern1 = (0..=255u8).cycle().take(max_frame_len.min(512)).collect();
    let pattern2 = (0..PATTERN2_LEN).map(|i| 0xFF - i as u8).collect();
    (pattern1, pattern2)
}

/// Run `iterations` loops, stopping at the first error or mismatch
pub fn run_stress<B: FullDuplex>(
    client: &mut RegClient<B>,
    iterations: u32,
    resync: bool,
    pb: &ProgressBar,
) -> Result<StressStats, Box<dyn std::error::Error>> {
    let (mut pattern1, mut pattern2) = patterns(client.config().max_frame_len);
    let mut readback1 = vec![0u8; pattern1.len()];
    let mut readback2 = vec![0u8; pattern2.len()];
    let mut stats = StressStats { loops: 0, bytes: 0 };

    for n in 1..=iterations {
        if resync {
            client.unsync()?;
            client.resync()?;
        }

        pattern1[0] = n as u8;
        pattern2[0] = n.wrapping_add(1) as u8;

        client.write(PATTERN1_ADDR, &pattern1)?;
        client.write(PATTERN2_ADDR, &pattern2)?;
        client.read(PATTERN1_ADDR, &mut readback1)?;
        client.read(PATTERN2_ADDR, &mut readback2)?;

        compare(PATTERN1_ADDR, &pattern1, &readback1)?;
        compare(PATTERN2_ADDR, &pattern2, &readback2)?;

        stats.loops = n;
        stats.bytes += 2 * (pattern1.len() + pattern2.len()) as u64;
        pb.set_position(u64::from(n));
        log::trace!("stress: loop {} passed", n);
    }

    Ok(stats)
}

/// Run the stress command
pub fn cmd_stress<B: FullDuplex>(
    client: &mut RegClient<B>,
    iterations: u32,
    resync: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(u64::from(iterations));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} loops ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let result = run_stress(client, iterations, resync, &pb);
    pb.finish_and_clear();
    let stats = result?;

    let secs = start.elapsed().as_secs_f64();
    let rate = if secs > 0.0 {
        stats.bytes as f64 / 1000.0 / secs
    } else {
        0.0
    };
    println!(
        "Moved {:.2} MBytes in {} loops over {:.1} s ({:.0} KByte/s)",
        stats.bytes as f64 / 1_000_000.0,
        stats.loops,
        secs,
        rate
    );
    Ok(())
}
