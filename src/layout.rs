//! Region geometry
//!
//! A pool region is carved into three contiguous parts:
//!
//! ```text
//! ┌─────────────────────────────┐ offset 0
//! │         Pool header         │
//! ├─────────────────────────────┤ desc_base
//! │   Sector descriptor 0..N    │
//! ├─────────────────────────────┤ payload_base
//! │   Payload sector 0..N (S)   │
//! └─────────────────────────────┘ payload_base + N*S
//! ```
//!
//! [`Geometry`] computes and validates the placement; a region that cannot
//! hold the header, the descriptor table, and every payload sector is
//! rejected up front instead of being silently overrun.

use crate::descriptor::DESC_SIZE;
use crate::error::{PoolError, Result};
use crate::header::HEADER_SIZE;
use serde::{Deserialize, Serialize};

/// Placement of the descriptor and payload arrays inside a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of sectors (N)
    pub sector_count: u32,
    /// Bytes per payload sector (S)
    pub sector_size: u32,
    /// Offset of descriptor 0
    pub desc_base: u32,
    /// Offset of payload sector 0
    pub payload_base: u32,
    /// Raw region size as supplied by the embedder
    pub total_memory: u32,
}

/// Minimum region size for a pool of `sector_count` sectors of
/// `sector_size` bytes each.
pub fn required_size(sector_count: u32, sector_size: u32) -> u64 {
    let per_sector = DESC_SIZE as u64 + sector_size as u64;
    (sector_count as u64)
        .checked_mul(per_sector)
        .and_then(|v| v.checked_add(HEADER_SIZE as u64))
        .unwrap_or(u64::MAX)
}

impl Geometry {
    /// Compute the layout for a region of `region_len` bytes
    ///
    /// Fails if either dimension is zero or the region cannot hold the
    /// header plus `sector_count` descriptors plus `sector_count *
    /// sector_size` payload bytes.
    pub fn for_region(region_len: usize, sector_count: u32, sector_size: u32) -> Result<Self> {
        if sector_count == 0 {
            return Err(PoolError::InvalidSectorCount(sector_count));
        }
        if sector_size == 0 {
            return Err(PoolError::InvalidSectorSize(sector_size));
        }
        if region_len > u32::MAX as usize {
            return Err(PoolError::Geometry(format!(
                "region of {} bytes exceeds u32 addressing",
                region_len
            )));
        }

        let required = required_size(sector_count, sector_size);
        if (region_len as u64) < required {
            return Err(PoolError::RegionTooSmall {
                required,
                actual: region_len as u64,
            });
        }

        let desc_base = HEADER_SIZE as u32;
        Ok(Geometry {
            sector_count,
            sector_size,
            desc_base,
            payload_base: desc_base + sector_count * DESC_SIZE as u32,
            total_memory: region_len as u32,
        })
    }

    /// Region offset of descriptor `index`
    pub fn desc_offset(&self, index: u32) -> usize {
        self.desc_base as usize + index as usize * DESC_SIZE
    }

    /// Region offset of the payload bytes for sector `index`
    pub fn payload_offset(&self, index: u32) -> usize {
        self.payload_base as usize + index as usize * self.sector_size as usize
    }

    /// Total usable payload bytes (`N * S`)
    pub fn payload_capacity(&self) -> usize {
        self.sector_count as usize * self.sector_size as usize
    }

    /// Percentage of the supplied region occupied by usable payload
    ///
    /// This is a geometric property fixed at initialization, not a live
    /// utilization metric.
    pub fn active_fraction(&self) -> f64 {
        (self.payload_capacity() as f64 * 100.0) / self.total_memory as f64
    }
}
