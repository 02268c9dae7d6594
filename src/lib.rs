//! # Sector Pool
//!
//! A fixed block of memory, supplied by the embedder, partitioned into a
//! header, a descriptor table, and equal-size payload sectors. On top of
//! the pool sits a chained stream abstraction: a logically contiguous
//! append-only byte stream whose storage is a linked list of sectors drawn
//! from the free set, with independent read and write cursors that may
//! straddle sector boundaries.
//!
//! ## Features
//!
//! - **No host allocation**: the pool lives entirely inside one
//!   caller-supplied byte region
//! - **Automatic chaining**: writes grow a stream sector by sector on
//!   demand, lazily
//! - **Consuming reads** across chain boundaries, plus a pure whole-stream
//!   peek
//! - **Relocatable layout**: all on-region fields are little-endian `u32`
//!   indices, so a region can be memory-mapped or handed between hosts
//!
//! ## Quick Start
//!
//! ```rust
//! use sector_pool::{required_size, Result, SectorPool};
//!
//! # fn main() -> Result<()> {
//! // The embedder owns the backing memory
//! let mut region = vec![0u8; required_size(20, 32) as usize];
//! let mut pool = SectorPool::init(&mut region, 20, 32)?;
//!
//! // Streams grow across sectors as needed
//! let stream = pool.allocate().expect("a free sector");
//! pool.write(stream, b"spills across the first sector boundary!");
//!
//! // Reads consume from the read cursor
//! let mut buf = [0u8; 16];
//! let n = pool.read(stream, &mut buf, 6);
//! assert_eq!(&buf[..n], b"spills");
//!
//! pool.free(stream);
//! assert_eq!(pool.used_sectors(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Region layout
//!
//! ```text
//! ┌─────────────────────────────┐
//! │         Pool header         │  magic, version, geometry
//! ├─────────────────────────────┤
//! │     Sector descriptor 0     │  flags, concat link, cursors
//! ├─────────────────────────────┤
//! │              .              │
//! ├─────────────────────────────┤
//! │    Sector descriptor N-1    │
//! ├─────────────────────────────┤
//! │      Payload sector 0       │  S bytes
//! ├─────────────────────────────┤
//! │              .              │
//! ├─────────────────────────────┤
//! │     Payload sector N-1      │
//! └─────────────────────────────┘
//! ```
//!
//! The modules mirror that structure:
//!
//! - [`error`] - Error types for pool construction
//! - [`layout`] - Region geometry and fit validation
//! - [`header`] - On-region header codec
//! - [`descriptor`] - Sector descriptor records and flags
//! - [`pool`] - [`SectorPool`]: allocation, release, queries
//! - `stream` - chained stream engine (`write`/`read`/`read_full`)

pub mod descriptor;
pub mod error;
pub mod header;
pub mod layout;
pub mod pool;
mod stream;

pub use descriptor::{Descriptor, SectorFlags, DESC_SIZE, NO_CONCAT};
pub use error::{PoolError, Result};
pub use header::{PoolHeader, HEADER_SIZE, MAGIC};
pub use layout::{required_size, Geometry};
pub use pool::{ChainHandle, PoolStats, SectorPool};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
