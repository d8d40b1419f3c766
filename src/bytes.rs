//! Non-owning byte string views over arena memory

use std::fmt;

use bstr::BStr;

use crate::arena::Arena;
use crate::error::{Result, RopeError};

/// A `(offset, length)` view into an [`Arena`]
///
/// Views never own memory and may alias each other freely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteStr {
    off: usize,
    len: usize,
}

impl ByteStr {
    /// Construct a view over `len` bytes starting at `off`
    pub const fn new(off: usize, len: usize) -> Self {
        Self { off, len }
    }

    pub const fn off(&self) -> usize {
        self.off
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset
    pub const fn end(&self) -> usize {
        self.off + self.len
    }

    /// Duplicate the viewed bytes into a new arena allocation
    pub fn copy_into(self, arena: &mut Arena) -> Result<ByteStr> {
        arena.copy(self)
    }

    /// Split off the prefix `[0, index)` as a fresh copy
    ///
    /// `self` shrinks in place to the suffix `[index, len)`.
    pub fn split_at(&mut self, arena: &mut Arena, index: usize) -> Result<ByteStr> {
        if index > self.len {
            return Err(RopeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let prefix = arena.copy(ByteStr::new(self.off, index))?;
        self.off += index;
        self.len -= index;
        Ok(prefix)
    }

    /// Zero-copy split into two views sharing the same bytes
    pub fn split_view(self, index: usize) -> Result<(ByteStr, ByteStr)> {
        if index > self.len {
            return Err(RopeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok((
            ByteStr::new(self.off, index),
            ByteStr::new(self.off + index, self.len - index),
        ))
    }

    pub fn as_bytes(self, arena: &Arena) -> Result<&[u8]> {
        arena.get(self)
    }

    /// Borrow the bytes as a `BStr` for lossy display
    pub fn as_bstr(self, arena: &Arena) -> Result<&BStr> {
        arena.get(self).map(BStr::new)
    }
}

impl fmt::Display for ByteStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.off, self.end())
    }
}
