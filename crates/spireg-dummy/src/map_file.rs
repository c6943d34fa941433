//! TOML register map files
//!
//! ```toml
//! [[region]]
//! name = "config"
//! base = 0x1000
//! size = 512
//!
//! [[region]]
//! name = "id"
//! base = 0xF000
//! size = "0x10"
//! readonly = true
//! ```

use std::fs;
use std::path::Path;

use crate::error::{MapError, Result};
use crate::regs::{DummyRegs, Region};

#[derive(Debug, serde::Deserialize)]
struct MapFile {
    #[serde(default)]
    region: Vec<MapRegion>,
}

#[derive(Debug, serde::Deserialize)]
struct MapRegion {
    name: String,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    base: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    size: u32,
    #[serde(default)]
    readonly: bool,
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(n),
        HexOrInt::Str(s) => parse_number(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

impl DummyRegs {
    /// Load a register map from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a register map from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: MapFile = toml::from_str(content)?;

        let mut regs = DummyRegs::new();
        for region in file.region {
            let base = u16::try_from(region.base).map_err(|_| MapError::OutOfRange {
                name: region.name.clone(),
                base: u16::MAX,
                size: region.size,
            })?;
            regs.add_region(Region {
                name: region.name,
                base,
                size: region.size,
                readonly: region.readonly,
            })?;
        }
        Ok(regs)
    }
}
