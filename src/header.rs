//! Pool header (region offset 0)
//!
//! The header occupies the first 32 bytes of the region and records the
//! pool geometry so an already-initialized region can be reattached with
//! [`SectorPool::open`](crate::pool::SectorPool::open). All multi-byte
//! fields are little-endian.
//!
//! ```text
//! offset  0  magic            [u8; 8]
//! offset  8  version_major    u16
//! offset 10  version_minor    u16
//! offset 12  sector_count     u32
//! offset 16  sector_size      u32
//! offset 20  desc_base        u32
//! offset 24  payload_base     u32
//! offset 28  total_memory     u32
//! ```

use crate::descriptor::DESC_SIZE;
use crate::error::{PoolError, Result};
use crate::layout::{required_size, Geometry};

pub const MAGIC: [u8; 8] = *b"SPOL\x00\x01\x00\x00";
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 0;
pub const HEADER_SIZE: usize = 32;

/// Pool header: format identification plus the region geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHeader {
    pub magic: [u8; 8],
    pub version_major: u16,
    pub version_minor: u16,
    pub geometry: Geometry,
}

impl PoolHeader {
    /// Create a header for a freshly computed geometry
    pub fn new(geometry: Geometry) -> Self {
        PoolHeader {
            magic: MAGIC,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            geometry,
        }
    }

    /// Validate magic, version, and internal geometry consistency
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(PoolError::InvalidMagic);
        }

        if self.version_major != VERSION_MAJOR || self.version_minor != VERSION_MINOR {
            return Err(PoolError::UnsupportedVersion {
                major: self.version_major,
                minor: self.version_minor,
            });
        }

        let geo = &self.geometry;
        if geo.sector_count == 0 {
            return Err(PoolError::InvalidSectorCount(0));
        }
        if geo.sector_size == 0 {
            return Err(PoolError::InvalidSectorSize(0));
        }
        if geo.desc_base as usize != HEADER_SIZE {
            return Err(PoolError::Geometry(format!(
                "descriptor base {} does not follow the header",
                geo.desc_base
            )));
        }
        let expected_payload = geo.desc_base as u64 + geo.sector_count as u64 * DESC_SIZE as u64;
        if geo.payload_base as u64 != expected_payload {
            return Err(PoolError::Geometry(format!(
                "payload base {} does not follow the descriptor table (expected {})",
                geo.payload_base, expected_payload
            )));
        }
        let required = required_size(geo.sector_count, geo.sector_size);
        if (geo.total_memory as u64) < required {
            return Err(PoolError::RegionTooSmall {
                required,
                actual: geo.total_memory as u64,
            });
        }

        Ok(())
    }

    /// Encode the header into the first [`HEADER_SIZE`] bytes of a region
    pub fn write_to(&self, region: &mut [u8]) {
        region[0..8].copy_from_slice(&self.magic);
        region[8..10].copy_from_slice(&self.version_major.to_le_bytes());
        region[10..12].copy_from_slice(&self.version_minor.to_le_bytes());
        region[12..16].copy_from_slice(&self.geometry.sector_count.to_le_bytes());
        region[16..20].copy_from_slice(&self.geometry.sector_size.to_le_bytes());
        region[20..24].copy_from_slice(&self.geometry.desc_base.to_le_bytes());
        region[24..28].copy_from_slice(&self.geometry.payload_base.to_le_bytes());
        region[28..32].copy_from_slice(&self.geometry.total_memory.to_le_bytes());
    }

    /// Decode and validate a header from the start of a region
    pub fn read_from(region: &[u8]) -> Result<Self> {
        if region.len() < HEADER_SIZE {
            return Err(PoolError::RegionTooSmall {
                required: HEADER_SIZE as u64,
                actual: region.len() as u64,
            });
        }

        let word = |at: usize| {
            u32::from_le_bytes([region[at], region[at + 1], region[at + 2], region[at + 3]])
        };

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&region[0..8]);

        let header = PoolHeader {
            magic,
            version_major: u16::from_le_bytes([region[8], region[9]]),
            version_minor: u16::from_le_bytes([region[10], region[11]]),
            geometry: Geometry {
                sector_count: word(12),
                sector_size: word(16),
                desc_base: word(20),
                payload_base: word(24),
                total_memory: word(28),
            },
        };

        header.validate()?;

        Ok(header)
    }
}
