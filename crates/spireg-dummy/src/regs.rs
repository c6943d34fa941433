//! In-memory register map
//!
//! A [`DummyRegs`] is a set of named, non-overlapping regions in the 16-bit
//! address space, each backed by zeroed memory. An access has to fall
//! entirely inside one region.

use spireg_core::{AccessError, RegisterMap};

use crate::error::{MapError, Result};

/// Size of the 16-bit register address space
pub const ADDRESS_SPACE: u32 = 0x1_0000;

/// Base address of the first default test register
pub const TEST_REG1_ADDR: u16 = 0x1000;
/// Base address of the second default test register
pub const TEST_REG2_ADDR: u16 = 0xF020;
/// Size of each default test register
pub const TEST_REG_SIZE: u32 = 512;

/// A named range of registers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Region name
    pub name: String,
    /// First address
    pub base: u16,
    /// Size in bytes
    pub size: u32,
    /// Writes are rejected
    pub readonly: bool,
}

impl Region {
    /// Create a writable region
    pub fn new(name: impl Into<String>, base: u16, size: u32) -> Self {
        Self {
            name: name.into(),
            base,
            size,
            readonly: false,
        }
    }

    /// Mark the region read-only
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// One past the last address (may be `0x10000`)
    pub fn end(&self) -> u32 {
        u32::from(self.base) + self.size
    }

    /// Check if `address` is inside this region
    pub fn contains(&self, address: u16) -> bool {
        let address = u32::from(address);
        address >= u32::from(self.base) && address < self.end()
    }

    fn overlaps(&self, other: &Region) -> bool {
        u32::from(self.base) < other.end() && u32::from(other.base) < self.end()
    }
}

#[derive(Debug, Clone)]
struct Mapped {
    region: Region,
    data: Vec<u8>,
}

/// Register map backed by memory
#[derive(Debug, Clone, Default)]
pub struct DummyRegs {
    regions: Vec<Mapped>,
}

impl DummyRegs {
    /// Create a map with no regions
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the whole address space as one writable region
    pub fn flat() -> Self {
        let mut regs = Self::new();
        regs.regions.push(Mapped {
            region: Region::new("flat", 0, ADDRESS_SPACE),
            data: vec![0; ADDRESS_SPACE as usize],
        });
        regs
    }

    /// The two 512-byte test registers at `0x1000` and `0xF020`
    pub fn test_regs() -> Self {
        let mut regs = Self::new();
        regs.regions.push(Mapped {
            region: Region::new("test_reg1", TEST_REG1_ADDR, TEST_REG_SIZE),
            data: vec![0; TEST_REG_SIZE as usize],
        });
        regs.regions.push(Mapped {
            region: Region::new("test_reg2", TEST_REG2_ADDR, TEST_REG_SIZE),
            data: vec![0; TEST_REG_SIZE as usize],
        });
        regs
    }

    /// Build a map from a list of regions
    pub fn from_regions(regions: impl IntoIterator<Item = Region>) -> Result<Self> {
        let mut regs = Self::new();
        for region in regions {
            regs.add_region(region)?;
        }
        Ok(regs)
    }

    /// Add a zero-filled region
    pub fn add_region(&mut self, region: Region) -> Result<()> {
        if region.size == 0 {
            return Err(MapError::EmptyRegion(region.name));
        }
        if region.end() > ADDRESS_SPACE {
            return Err(MapError::OutOfRange {
                name: region.name,
                base: region.base,
                size: region.size,
            });
        }
        for mapped in &self.regions {
            if mapped.region.name == region.name {
                return Err(MapError::DuplicateName(region.name));
            }
            if mapped.region.overlaps(&region) {
                return Err(MapError::Overlap(region.name, mapped.region.name.clone()));
            }
        }

        log::debug!(
            "dummy: mapped '{}' at 0x{:04X}..0x{:05X}{}",
            region.name,
            region.base,
            region.end(),
            if region.readonly { " (read-only)" } else { "" }
        );
        let data = vec![0; region.size as usize];
        self.regions.push(Mapped { region, data });
        self.regions.sort_by_key(|m| m.region.base);
        Ok(())
    }

    /// Mapped regions in address order
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().map(|m| &m.region)
    }

    /// Contents of the region called `name`
    pub fn region_data(&self, name: &str) -> Option<&[u8]> {
        self.regions
            .iter()
            .find(|m| m.region.name == name)
            .map(|m| m.data.as_slice())
    }

    /// Bytes at `address..address + len`, if they lie inside one region
    pub fn peek(&self, address: u16, len: usize) -> Option<&[u8]> {
        let index = self.regions.iter().position(|m| m.region.contains(address))?;
        let (start, end) = self.span(index, address, len).ok()?;
        Some(&self.regions[index].data[start..end])
    }

    /// Store bytes directly, bypassing the read-only flag
    pub fn poke(&mut self, address: u16, data: &[u8]) -> std::result::Result<(), AccessError> {
        let index = self.locate(address)?;
        let (start, end) = self.span(index, address, data.len())?;
        self.regions[index].data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn locate(&self, address: u16) -> std::result::Result<usize, AccessError> {
        self.regions
            .iter()
            .position(|m| m.region.contains(address))
            .ok_or(AccessError::Unmapped)
    }

    /// Offsets of an access inside region `index`
    fn span(
        &self,
        index: usize,
        address: u16,
        len: usize,
    ) -> std::result::Result<(usize, usize), AccessError> {
        let region = &self.regions[index].region;
        let start = usize::from(address - region.base);
        let end = start + len;
        if end > region.size as usize {
            return Err(AccessError::OutOfBounds);
        }
        Ok((start, end))
    }
}

impl RegisterMap for DummyRegs {
    fn read(&mut self, address: u16, buf: &mut [u8]) -> std::result::Result<(), AccessError> {
        let index = self.locate(address)?;
        let (start, end) = self.span(index, address, buf.len())?;
        buf.copy_from_slice(&self.regions[index].data[start..end]);
        log::trace!("dummy: read {} bytes at 0x{:04X}", buf.len(), address);
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> std::result::Result<(), AccessError> {
        let index = self.locate(address)?;
        if self.regions[index].region.readonly {
            return Err(AccessError::ReadOnly);
        }
        let (start, end) = self.span(index, address, data.len())?;
        self.regions[index].data[start..end].copy_from_slice(data);
        log::trace!("dummy: wrote {} bytes at 0x{:04X}", data.len(), address);
        Ok(())
    }
}
