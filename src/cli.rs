//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default payload buffer size of the slave
const DEFAULT_MAX_FRAME_LEN: usize = 512;

const PROGRAMMER_HELP: &str =
    "Programmer to use, as name[:key=value,...] (e.g. sim, linux_spi:dev=/dev/spidev0.0)";

/// Parse a string as a hex or decimal u16
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal length
pub fn parse_len(s: &str) -> Result<usize, String> {
    let len = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?
    } else {
        s.parse::<usize>().map_err(|e| format!("Invalid number: {}", e))?
    };
    if len == 0 {
        return Err("Length must be at least 1".to_string());
    }
    Ok(len)
}

/// Bytes given on the command line as hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexData(pub Vec<u8>);

/// Parse a hex byte string such as `aabb`, `aa bb` or `0xaa,0xbb`
pub fn parse_hex_bytes(s: &str) -> Result<HexData, String> {
    let mut digits = String::new();
    for token in s.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid hex data '{}'", token));
        }
        if token.len() % 2 != 0 {
            return Err(format!("Odd number of hex digits in '{}'", token));
        }
        digits.push_str(token);
    }
    if digits.is_empty() {
        return Err("No data given".to_string());
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| format!("Invalid hex byte '{}': {}", &digits[i..i + 2], e))
        })
        .collect::<Result<Vec<u8>, String>>()
        .map(HexData)
}

#[derive(Parser)]
#[command(name = "spireg")]
#[command(author, version, about = "Register access over a framed SPI link", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Payload buffer size of the slave
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_FRAME_LEN, value_parser = parse_len)]
    pub max_frame_len: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and clear the slave's status byte
    Status {
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,
    },

    /// Read registers
    Read {
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Start address (hex, e.g., 0x1000)
        #[arg(long, value_parser = parse_hex_u16)]
        addr: u16,

        /// Number of bytes to read (hex or decimal)
        #[arg(long, value_parser = parse_len)]
        len: usize,

        /// Output file path (hex dump to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write registers
    Write {
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Start address (hex, e.g., 0x1000)
        #[arg(long, value_parser = parse_hex_u16)]
        addr: u16,

        /// Bytes to write as hex (e.g., "aa bb" or aabb)
        #[arg(long, value_parser = parse_hex_bytes, conflicts_with = "input", required_unless_present = "input")]
        data: Option<HexData>,

        /// Input file with the bytes to write
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Read the data back and compare
        #[arg(long)]
        verify: bool,
    },

    /// Bring a desynchronized slave back to waiting for a frame
    Resync {
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Desynchronize the slave first
        #[arg(long)]
        unsync: bool,
    },

    /// Write, read back and compare two test patterns in a loop
    Stress {
        #[arg(short, long, help = PROGRAMMER_HELP)]
        programmer: String,

        /// Number of loops
        #[arg(short = 'n', long, default_value_t = 100)]
        iterations: u32,

        /// Skip the unsync/resync cycle at the start of each loop
        #[arg(long)]
        no_resync: bool,
    },

    /// List supported programmers
    ListProgrammers,
}
