//! Error types for register map construction

use thiserror::Error;

/// Errors building or loading a register map
#[derive(Debug, Error)]
pub enum MapError {
    /// A region has no bytes
    #[error("Region '{0}' is empty")]
    EmptyRegion(String),

    /// A region runs past the end of the 16-bit address space
    #[error("Region '{name}' at 0x{base:04X} with size {size} runs past 0xFFFF")]
    OutOfRange { name: String, base: u16, size: u32 },

    /// Two regions share addresses
    #[error("Region '{0}' overlaps region '{1}'")]
    Overlap(String, String),

    /// Two regions share a name
    #[error("Duplicate region name '{0}'")]
    DuplicateName(String),

    /// Failed to read a map file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a map file
    #[error("Invalid register map: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for register map operations
pub type Result<T> = std::result::Result<T, MapError>;
