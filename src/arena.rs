//! Bump arena backing all rope text and tree nodes
//!
//! The buffer is allocated once with a fixed capacity and never grows.
//! Individual allocations are never freed: `clear` releases everything at
//! once and advances the generation, which lets the node stores reject
//! handles handed out before the reset.

use std::mem;

use tracing::debug;

use crate::bytes::ByteStr;
use crate::error::{Result, RopeError};

/// Alignment used for byte string storage
pub const BYTES_ALIGN: usize = 8;

/// Fixed-capacity bump allocator
pub struct Arena {
    /// Backing storage, allocated once
    data: Box<[u8]>,
    /// Bytes handed out so far, alignment padding included
    used: usize,
    /// Incremented by every `clear`
    generation: u32,
}

impl Arena {
    /// Create an arena with a zeroed buffer of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
            generation: 0,
        }
    }

    /// Carve a zeroed region of `size` bytes whose address is a multiple of `align`
    ///
    /// Returns the region's offset within the arena. A failed request leaves
    /// the arena untouched. A zero-size request takes no space and no padding,
    /// and returns the current offset.
    pub fn push(&mut self, size: usize, align: usize) -> Result<usize> {
        if !align.is_power_of_two() {
            return Err(RopeError::MisalignedRequest { align });
        }
        if size == 0 {
            return Ok(self.used);
        }

        // Align the real address, not just the offset
        let base = self.data.as_ptr() as usize;
        let unaligned = base + self.used;
        let padding = unaligned.next_multiple_of(align) - unaligned;

        let start = self.used + padding;
        let end = start
            .checked_add(size)
            .filter(|&end| end <= self.data.len())
            .ok_or(RopeError::OutOfCapacity {
                requested: size,
                remaining: self.remaining(),
            })?;

        self.data[start..end].fill(0);
        self.used = end;
        Ok(start)
    }

    /// Charge the size of one `T` against the arena budget
    pub fn reserve<T>(&mut self) -> Result<usize> {
        self.push(mem::size_of::<T>(), mem::align_of::<T>())
    }

    /// Copy `bytes` into the arena and return an owned view of the copy
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<ByteStr> {
        let off = self.push(bytes.len(), BYTES_ALIGN)?;
        self.data[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(ByteStr::new(off, bytes.len()))
    }

    /// Duplicate the bytes behind `view` into a fresh allocation
    pub fn copy(&mut self, view: ByteStr) -> Result<ByteStr> {
        self.check(view)?;
        let off = self.push(view.len(), BYTES_ALIGN)?;
        self.data.copy_within(view.off()..view.end(), off);
        Ok(ByteStr::new(off, view.len()))
    }

    /// Resolve a view to its bytes
    pub fn get(&self, view: ByteStr) -> Result<&[u8]> {
        self.check(view)?;
        Ok(&self.data[view.off()..view.end()])
    }

    fn check(&self, view: ByteStr) -> Result<()> {
        if view.end() > self.used {
            return Err(RopeError::invariant(format!(
                "view {} reaches past the {} bytes in use",
                view, self.used
            )));
        }
        Ok(())
    }

    /// Reject a handle minted before the last `clear`
    pub fn check_generation(&self, generation: u32) -> Result<()> {
        if generation != self.generation {
            return Err(RopeError::StaleHandle {
                handle: generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Logically free everything at once
    pub fn clear(&mut self) {
        debug!(used = self.used, generation = self.generation, "clearing arena");
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Get total bytes handed out
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// Generation the arena is currently at
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Check if nothing has been allocated since creation or the last clear
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
}
