//! Sector pool over a caller-supplied region
//!
//! [`SectorPool`] borrows one mutable byte region for its lifetime and owns
//! everything inside it: the header, the descriptor table, and the payload
//! sectors. It never allocates from the host; memory is acquired exactly
//! once through the region argument and released when the caller drops the
//! region.
//!
//! The pool is single-threaded by construction: holding `&mut [u8]` makes
//! exclusive mutation a compile-time property. Callers needing concurrent
//! access must serialize externally or partition one pool per thread.

use crate::descriptor::{Descriptor, SectorFlags, DESC_SIZE};
use crate::error::{PoolError, Result};
use crate::header::PoolHeader;
use crate::layout::Geometry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Handle to the head of a chain, as returned by [`SectorPool::allocate`]
///
/// Only the head descriptor carries authoritative read/write cursors, so
/// every cursor-bearing operation takes a handle rather than a raw sector
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHandle(pub(crate) u32);

impl ChainHandle {
    /// Index of the head descriptor, for diagnostics
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolStats {
    pub sector_count: u32,
    pub sector_size: u32,
    pub used_sectors: usize,
    pub free_sectors: usize,
    /// Total bytes written into live chains
    pub bytes_in_use: usize,
    /// Percentage of the region occupied by usable payload (fixed at init)
    pub active_fraction: f64,
}

/// Fixed pool of equal-size sectors carved out of one byte region
pub struct SectorPool<'a> {
    region: &'a mut [u8],
    geometry: Geometry,
}

impl<'a> SectorPool<'a> {
    /// Initialize a region as an empty pool of `sector_count` sectors of
    /// `sector_size` bytes each
    ///
    /// Writes the header and the descriptor table; payload bytes are left
    /// as supplied. Fails if the region cannot hold the computed layout
    /// (see [`required_size`](crate::layout::required_size)).
    pub fn init(region: &'a mut [u8], sector_count: u32, sector_size: u32) -> Result<Self> {
        let geometry = Geometry::for_region(region.len(), sector_count, sector_size)?;
        PoolHeader::new(geometry).write_to(region);

        let mut pool = SectorPool { region, geometry };
        for index in 0..sector_count {
            pool.put_descriptor(index, Descriptor::reset());
        }

        debug!(
            sector_count,
            sector_size,
            total_memory = geometry.total_memory,
            "sector pool initialized"
        );
        Ok(pool)
    }

    /// Attach to a region that already holds an initialized pool
    ///
    /// Validates the header (magic, version, geometry) and that the
    /// supplied region is at least as large as the one the pool was
    /// initialized with. Descriptor state is taken as-is, so live chains
    /// survive a reattach.
    pub fn open(region: &'a mut [u8]) -> Result<Self> {
        let header = PoolHeader::read_from(region)?;
        let geometry = header.geometry;
        if region.len() < geometry.total_memory as usize {
            return Err(PoolError::RegionTooSmall {
                required: geometry.total_memory as u64,
                actual: region.len() as u64,
            });
        }

        debug!(
            sector_count = geometry.sector_count,
            sector_size = geometry.sector_size,
            "sector pool reopened"
        );
        Ok(SectorPool { region, geometry })
    }

    /// The pool's computed layout
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Claim the first free sector as the head of a new chain
    ///
    /// Linear first-fit over the descriptor table. Returns `None` when
    /// every sector is in use.
    pub fn allocate(&mut self) -> Option<ChainHandle> {
        self.claim_free_sector().map(ChainHandle)
    }

    /// Release a chain: the head and every sector reachable through its
    /// concat links
    ///
    /// Each node has its flags cleared and cursors zeroed. Stale concat
    /// values are left in place; they are unreachable once `CONCAT` is
    /// cleared. Freeing an already-free head is a no-op.
    pub fn free(&mut self, head: ChainHandle) {
        let mut cur = head.0;
        loop {
            let desc = self.descriptor(cur);
            if desc.is_free() {
                break;
            }
            let link = desc.concat_link();
            self.put_descriptor(
                cur,
                Descriptor {
                    flags: SectorFlags::empty(),
                    concat: desc.concat,
                    read_index: 0,
                    write_index: 0,
                },
            );
            match link {
                Some(next) => cur = next,
                None => break,
            }
        }
    }

    /// Zero both cursors on the head
    ///
    /// Concat-allocated sectors are not released; they remain `USED` and
    /// subsequent writes reuse the existing chain capacity before growing
    /// further.
    pub fn reset(&mut self, head: ChainHandle) {
        let mut desc = self.descriptor(head.0);
        desc.read_index = 0;
        desc.write_index = 0;
        self.put_descriptor(head.0, desc);
    }

    /// Number of sectors currently marked `USED`
    pub fn used_sectors(&self) -> usize {
        (0..self.geometry.sector_count)
            .filter(|&index| !self.descriptor(index).is_free())
            .count()
    }

    /// Percentage of the region occupied by usable payload
    ///
    /// A geometric constant of the pool, not a live-usage metric; see
    /// [`bytes_in_use`](Self::bytes_in_use) for the latter.
    pub fn active_fraction(&self) -> f64 {
        self.geometry.active_fraction()
    }

    /// Total bytes written into live chains
    ///
    /// Head cursors are the single source of truth for chain length and
    /// mid-chain descriptors keep zeroed cursors, so summing `write_index`
    /// over used descriptors counts exactly the bytes held by chain heads.
    pub fn bytes_in_use(&self) -> usize {
        (0..self.geometry.sector_count)
            .map(|index| self.descriptor(index))
            .filter(|desc| !desc.is_free())
            .map(|desc| desc.write_index as usize)
            .sum()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        let used = self.used_sectors();
        PoolStats {
            sector_count: self.geometry.sector_count,
            sector_size: self.geometry.sector_size,
            used_sectors: used,
            free_sectors: self.geometry.sector_count as usize - used,
            bytes_in_use: self.bytes_in_use(),
            active_fraction: self.active_fraction(),
        }
    }

    pub(crate) fn claim_free_sector(&mut self) -> Option<u32> {
        for index in 0..self.geometry.sector_count {
            if self.descriptor(index).is_free() {
                self.put_descriptor(index, Descriptor::claimed());
                return Some(index);
            }
        }
        None
    }

    pub(crate) fn descriptor(&self, index: u32) -> Descriptor {
        let at = self.geometry.desc_offset(index);
        Descriptor::read_from(&self.region[at..at + DESC_SIZE])
    }

    pub(crate) fn put_descriptor(&mut self, index: u32, desc: Descriptor) {
        let at = self.geometry.desc_offset(index);
        desc.write_to(&mut self.region[at..at + DESC_SIZE]);
    }

    pub(crate) fn payload(&self, index: u32) -> &[u8] {
        let at = self.geometry.payload_offset(index);
        &self.region[at..at + self.geometry.sector_size as usize]
    }

    pub(crate) fn payload_mut(&mut self, index: u32) -> &mut [u8] {
        let at = self.geometry.payload_offset(index);
        &mut self.region[at..at + self.geometry.sector_size as usize]
    }

    pub(crate) fn sector_size(&self) -> usize {
        self.geometry.sector_size as usize
    }
}
