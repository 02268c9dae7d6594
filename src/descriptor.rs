//! Sector descriptor records
//!
//! One 16-byte descriptor per payload sector, stored in the region between
//! the pool header and the payload array. All fields are little-endian
//! `u32`, so a region initialized on one host can be reopened on another.

use bitflags::bitflags;

/// Size of one encoded descriptor in the region
pub const DESC_SIZE: usize = 16;

/// Sentinel for a descriptor with no concat link
pub const NO_CONCAT: u32 = u32::MAX;

bitflags! {
    /// Sector state flags
    ///
    /// The numeric values match the original wire layout: an empty set is a
    /// free sector, `USED` marks an allocated one, and `CONCAT` marks a
    /// sector whose `concat` field links to the next sector of its chain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectorFlags: u32 {
        const USED = 0x01;
        const CONCAT = 0x10;
    }
}

/// Metadata record for one payload sector
///
/// `read_index` and `write_index` are byte offsets into the logical chain
/// and are authoritative only on a chain head. Mid-chain descriptors keep
/// the zeroed cursors they were claimed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub flags: SectorFlags,
    /// Index of the next descriptor in the chain; `NO_CONCAT` when absent
    pub concat: u32,
    pub read_index: u32,
    pub write_index: u32,
}

impl Descriptor {
    /// A free descriptor, as written at pool initialization
    pub fn reset() -> Self {
        Descriptor {
            flags: SectorFlags::empty(),
            concat: NO_CONCAT,
            read_index: 0,
            write_index: 0,
        }
    }

    /// A freshly allocated descriptor: used, unchained, cursors at zero
    pub fn claimed() -> Self {
        Descriptor {
            flags: SectorFlags::USED,
            concat: NO_CONCAT,
            read_index: 0,
            write_index: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        !self.flags.contains(SectorFlags::USED)
    }

    /// The chain link, present only when `CONCAT` is set
    pub fn concat_link(&self) -> Option<u32> {
        if self.flags.contains(SectorFlags::CONCAT) {
            Some(self.concat)
        } else {
            None
        }
    }

    /// Decode a descriptor from its 16-byte region slot
    pub fn read_from(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= DESC_SIZE);
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Descriptor {
            flags: SectorFlags::from_bits_retain(word(0)),
            concat: word(4),
            read_index: word(8),
            write_index: word(12),
        }
    }

    /// Encode this descriptor into its 16-byte region slot
    pub fn write_to(&self, bytes: &mut [u8]) {
        debug_assert!(bytes.len() >= DESC_SIZE);
        bytes[0..4].copy_from_slice(&self.flags.bits().to_le_bytes());
        bytes[4..8].copy_from_slice(&self.concat.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.read_index.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.write_index.to_le_bytes());
    }
}
