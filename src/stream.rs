//! Chain & stream engine
//!
//! A chain is a logically contiguous append-only byte stream stored as a
//! linked list of equal-size sectors. The head descriptor's cursors are the
//! single source of truth: `write_index` is the total stream length and
//! `read_index` the consumed prefix. The logical byte at offset `k` lives
//! in the sector reached by walking concat links while subtracting the
//! sector size from `k` until `k` fits.
//!
//! Both seek loops compare with a strict `>` against the sector size: a
//! cursor sitting exactly at a sector boundary stays on the full sector
//! rather than pre-advancing into storage that may not exist yet. Growth
//! happens lazily, on the write that actually needs the next sector.

use crate::descriptor::SectorFlags;
use crate::pool::{ChainHandle, SectorPool};
use tracing::{debug, trace};

impl<'a> SectorPool<'a> {
    /// Append `src` to the chain, growing it sector by sector on demand
    ///
    /// Returns the number of bytes appended; fewer than `src.len()` only
    /// when the pool ran out of free sectors mid-append. Existing bytes
    /// are never overwritten.
    pub fn write(&mut self, head: ChainHandle, src: &[u8]) -> usize {
        if src.is_empty() {
            return 0;
        }
        let sector = self.sector_size();

        // Seek to the sector holding the write cursor
        let mut cur = head.0;
        let mut offset = self.descriptor(head.0).write_index as usize;
        while offset > sector {
            match self.descriptor(cur).concat_link() {
                Some(next) => {
                    offset -= sector;
                    cur = next;
                }
                None => break,
            }
        }

        let mut written = 0;
        while written < src.len() {
            let remaining = src.len() - written;
            let tail = sector - offset;

            let (span, next) = if remaining > tail {
                // The rest of this write spills past the current sector
                let link = match self.descriptor(cur).concat_link() {
                    Some(link) => link,
                    None => match self.claim_free_sector() {
                        Some(index) => {
                            let mut desc = self.descriptor(cur);
                            desc.flags.insert(SectorFlags::CONCAT);
                            desc.concat = index;
                            self.put_descriptor(cur, desc);
                            trace!(head = head.0, sector = index, "chain extended");
                            index
                        }
                        None => {
                            debug!(
                                head = head.0,
                                written,
                                requested = src.len(),
                                "pool exhausted mid-append"
                            );
                            break;
                        }
                    },
                };
                (remaining.min(tail), link)
            } else {
                (remaining, cur)
            };

            self.payload_mut(cur)[offset..offset + span]
                .copy_from_slice(&src[written..written + span]);
            written += span;

            let mut head_desc = self.descriptor(head.0);
            head_desc.write_index += span as u32;
            self.put_descriptor(head.0, head_desc);

            cur = next;
            offset = 0;
        }

        written
    }

    /// Consume up to `want` bytes from the read cursor into `dst`
    ///
    /// Copies `min(want, dst.len(), available)` bytes, advances the head's
    /// `read_index` by the copied count, and returns it.
    pub fn read(&mut self, head: ChainHandle, dst: &mut [u8], want: usize) -> usize {
        let head_desc = self.descriptor(head.0);
        let available = (head_desc.write_index - head_desc.read_index) as usize;
        let mut remaining = want.min(available).min(dst.len());
        if remaining == 0 {
            return 0;
        }
        let sector = self.sector_size();

        // Seek to the sector holding the read cursor
        let mut cur = head.0;
        let mut offset = head_desc.read_index as usize;
        while offset > sector {
            match self.descriptor(cur).concat_link() {
                Some(next) => {
                    offset -= sector;
                    cur = next;
                }
                None => break,
            }
        }

        let mut copied = 0;
        loop {
            let span = remaining.min(sector - offset);
            dst[copied..copied + span].copy_from_slice(&self.payload(cur)[offset..offset + span]);
            copied += span;
            remaining -= span;

            let mut head_desc = self.descriptor(head.0);
            head_desc.read_index += span as u32;
            self.put_descriptor(head.0, head_desc);

            if remaining == 0 {
                break;
            }
            match self.descriptor(cur).concat_link() {
                Some(next) => {
                    cur = next;
                    offset = 0;
                }
                None => break,
            }
        }

        copied
    }

    /// Copy the whole stream from logical offset 0 into `dst`, without
    /// touching either cursor
    ///
    /// Returns `min(dst.len(), write_index)` bytes. Two successive calls
    /// yield identical data.
    pub fn read_full(&self, head: ChainHandle, dst: &mut [u8]) -> usize {
        let head_desc = self.descriptor(head.0);
        let mut remaining = (head_desc.write_index as usize).min(dst.len());
        if remaining == 0 {
            return 0;
        }
        let sector = self.sector_size();

        let mut cur = head.0;
        let mut copied = 0;
        loop {
            let span = remaining.min(sector);
            dst[copied..copied + span].copy_from_slice(&self.payload(cur)[..span]);
            copied += span;
            remaining -= span;

            if remaining == 0 {
                break;
            }
            match self.descriptor(cur).concat_link() {
                Some(next) => cur = next,
                None => break,
            }
        }

        copied
    }

    /// Bytes a subsequent [`read`](Self::read) can consume:
    /// `write_index - read_index`
    pub fn available(&self, head: ChainHandle) -> usize {
        let desc = self.descriptor(head.0);
        (desc.write_index - desc.read_index) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::required_size;

    fn pool_region(sectors: u32, size: u32) -> Vec<u8> {
        vec![0u8; required_size(sectors, size) as usize]
    }

    #[test]
    fn test_write_within_one_sector() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();

        assert_eq!(pool.write(head, b"hello"), 5);
        assert_eq!(pool.available(head), 5);
        assert_eq!(pool.used_sectors(), 1);
    }

    #[test]
    fn test_write_empty_source_has_no_effect() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();

        assert_eq!(pool.write(head, &[]), 0);
        assert_eq!(pool.available(head), 0);
    }

    #[test]
    fn test_write_grows_chain_across_sectors() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();

        assert_eq!(pool.write(head, b"0123456789abcdefghij"), 20);
        assert_eq!(pool.used_sectors(), 3);
        assert_eq!(pool.available(head), 20);

        let mut buf = [0u8; 32];
        let n = pool.read(head, &mut buf, 32);
        assert_eq!(&buf[..n], b"0123456789abcdefghij");
    }

    #[test]
    fn test_exact_fill_does_not_preallocate() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();

        // Exactly one sector: growth stays lazy
        assert_eq!(pool.write(head, &[7u8; 8]), 8);
        assert_eq!(pool.used_sectors(), 1);

        // The next byte triggers the chain
        assert_eq!(pool.write(head, &[8u8; 1]), 1);
        assert_eq!(pool.used_sectors(), 2);

        let mut buf = [0u8; 16];
        assert_eq!(pool.read(head, &mut buf, 16), 9);
        assert_eq!(&buf[..8], &[7u8; 8]);
        assert_eq!(buf[8], 8);
    }

    #[test]
    fn test_exhaustion_returns_short_count() {
        let mut region = pool_region(2, 8);
        let mut pool = SectorPool::init(&mut region, 2, 8).unwrap();
        let head = pool.allocate().unwrap();

        // A spilling write secures the next sector before filling the
        // current tail, so with one free sector only the first 8 bytes of
        // the 20 land before the claim for a third sector fails
        assert_eq!(pool.write(head, &[1u8; 20]), 8);
        assert_eq!(pool.available(head), 8);
        assert_eq!(pool.used_sectors(), 2);

        // The sector claimed during the short write stays chained, so a
        // small follow-up append still fits
        assert_eq!(pool.write(head, &[2u8; 1]), 1);
        assert_eq!(pool.available(head), 9);

        // Another spilling write has nothing left to claim
        assert_eq!(pool.write(head, &[3u8; 20]), 0);
    }

    #[test]
    fn test_read_clamps_to_available() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"abcdef");

        let mut buf = [0u8; 64];
        assert_eq!(pool.read(head, &mut buf, 100), 6);
        assert_eq!(&buf[..6], b"abcdef");
        assert_eq!(pool.read(head, &mut buf, 100), 0);
    }

    #[test]
    fn test_read_clamps_to_target() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"abcdef");

        let mut buf = [0u8; 4];
        assert_eq!(pool.read(head, &mut buf, 100), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(pool.available(head), 2);
    }

    #[test]
    fn test_read_into_empty_target() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"abcdef");

        assert_eq!(pool.read(head, &mut [], 6), 0);
        assert_eq!(pool.available(head), 6);
    }

    #[test]
    fn test_read_from_empty_chain() {
        let mut region = pool_region(4, 32);
        let mut pool = SectorPool::init(&mut region, 4, 32).unwrap();
        let head = pool.allocate().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(pool.read(head, &mut buf, 8), 0);
    }

    #[test]
    fn test_read_resumes_at_sector_boundary() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"0123456789");

        let mut buf = [0u8; 8];
        // Consume exactly the first sector, leaving the cursor on the boundary
        assert_eq!(pool.read(head, &mut buf, 8), 8);
        assert_eq!(&buf, b"01234567");

        assert_eq!(pool.read(head, &mut buf, 8), 2);
        assert_eq!(&buf[..2], b"89");
    }

    #[test]
    fn test_read_straddles_sectors() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"0123456789abcdefghij");

        let mut buf = [0u8; 7];
        assert_eq!(pool.read(head, &mut buf, 7), 7);
        assert_eq!(&buf, b"0123456");
        assert_eq!(pool.read(head, &mut buf, 7), 7);
        assert_eq!(&buf, b"789abcd");
        assert_eq!(pool.read(head, &mut buf, 7), 6);
        assert_eq!(&buf[..6], b"efghij");
    }

    #[test]
    fn test_read_full_is_pure() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"0123456789");

        // Consume a prefix, then peek twice
        let mut sink = [0u8; 4];
        pool.read(head, &mut sink, 4);

        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        assert_eq!(pool.read_full(head, &mut first), 10);
        assert_eq!(pool.read_full(head, &mut second), 10);
        assert_eq!(&first[..10], b"0123456789");
        assert_eq!(first, second);

        // Cursors untouched
        assert_eq!(pool.available(head), 6);
    }

    #[test]
    fn test_read_full_clamps_to_target() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();
        pool.write(head, b"0123456789");

        let mut buf = [0u8; 5];
        assert_eq!(pool.read_full(head, &mut buf), 5);
        assert_eq!(&buf, b"01234");
    }

    #[test]
    fn test_read_full_on_empty_chain() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(pool.read_full(head, &mut buf), 0);
    }

    #[test]
    fn test_reset_reuses_chain_capacity() {
        let mut region = pool_region(3, 8);
        let mut pool = SectorPool::init(&mut region, 3, 8).unwrap();
        let head = pool.allocate().unwrap();

        // Consume every sector, then reset
        assert_eq!(pool.write(head, &[1u8; 24]), 24);
        assert_eq!(pool.used_sectors(), 3);
        pool.reset(head);

        // No free sectors remain, yet the chain's own capacity is writable
        assert_eq!(pool.write(head, &[2u8; 24]), 24);
        assert_eq!(pool.used_sectors(), 3);

        let mut buf = [0u8; 24];
        assert_eq!(pool.read(head, &mut buf, 24), 24);
        assert_eq!(buf, [2u8; 24]);
    }

    #[test]
    fn test_interleaved_chains_do_not_interfere() {
        let mut region = pool_region(6, 8);
        let mut pool = SectorPool::init(&mut region, 6, 8).unwrap();
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();

        // Alternating appends force interleaved sector claims
        pool.write(a, b"aaaaaaaaaa");
        pool.write(b, b"bbbbbbbbbb");
        pool.write(a, b"AAAA");
        pool.write(b, b"BBBB");

        let mut buf = [0u8; 16];
        let n = pool.read(a, &mut buf, 16);
        assert_eq!(&buf[..n], b"aaaaaaaaaaAAAA");
        let n = pool.read(b, &mut buf, 16);
        assert_eq!(&buf[..n], b"bbbbbbbbbbBBBB");
    }

    #[test]
    fn test_append_after_partial_read() {
        let mut region = pool_region(4, 8);
        let mut pool = SectorPool::init(&mut region, 4, 8).unwrap();
        let head = pool.allocate().unwrap();

        pool.write(head, b"01234");
        let mut buf = [0u8; 3];
        pool.read(head, &mut buf, 3);

        pool.write(head, b"56789");
        assert_eq!(pool.available(head), 7);

        let mut rest = [0u8; 16];
        let n = pool.read(head, &mut rest, 16);
        assert_eq!(&rest[..n], b"3456789");
    }
}
