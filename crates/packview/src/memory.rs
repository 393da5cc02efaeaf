// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked, cursor-advancing view over a byte buffer.
//!
//! One `Memory` models exactly one in-flight decode pass. The cursor only
//! advances; `base <= cursor <= len` holds at all times, and a completed
//! pass must consume the buffer exactly (checked by [`Memory::finish`]).
//! `Memory` never mutates the underlying buffer.

use crate::error::UnpackError;

/// Cursor-tracking read view over a byte buffer.
#[derive(Debug)]
pub struct Memory<'a> {
    buf: &'a [u8],
    base: usize,
    cursor: usize,
}

impl<'a> Memory<'a> {
    /// Create a view over the full buffer, cursor at the start.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            base: 0,
            cursor: 0,
        }
    }

    /// Create a view whose pass starts at `base`.
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        assert!(base <= buf.len(), "base offset past end of buffer");
        Self {
            buf,
            base,
            cursor: base,
        }
    }

    /// Current cursor position (absolute offset into the buffer).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes remaining between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// True once the cursor has reached the end of the buffer.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.buf.len()
    }

    /// The unconsumed tail of the buffer.
    pub fn tail(&self) -> &'a [u8] {
        &self.buf[self.cursor..]
    }

    /// Reset the cursor to the configured base for a fresh pass.
    pub fn rewind(&mut self) {
        self.cursor = self.base;
    }

    /// Consume `n` bytes at the cursor and advance it.
    ///
    /// On shortfall the cursor stays put and the error carries the
    /// requested count, the available count, and the consuming type's name.
    pub fn take(&mut self, n: usize, type_name: &str) -> Result<&'a [u8], UnpackError> {
        let available = self.remaining();
        if available < n {
            return Err(UnpackError::InsufficientMemory {
                type_name: type_name.to_string(),
                offset: None,
                needed: n,
                available,
                dump: None,
            });
        }
        let slice = &self.buf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(slice)
    }

    /// Read `n` bytes at an absolute offset without moving the cursor.
    ///
    /// Used to re-inspect an already-consumed region, e.g. a bit-record
    /// container. The error carries the explicit offset.
    pub fn peek_at(&self, at: usize, n: usize, type_name: &str) -> Result<&'a [u8], UnpackError> {
        let available = self.buf.len().saturating_sub(at);
        if available < n {
            return Err(UnpackError::InsufficientMemory {
                type_name: type_name.to_string(),
                offset: Some(at),
                needed: n,
                available,
                dump: None,
            });
        }
        Ok(&self.buf[at..at + n])
    }

    /// Exactness check at the end of a pass: any unconsumed bytes fail with
    /// an excess-memory error carrying the leftover offset and slice.
    pub fn finish(&self) -> Result<(), UnpackError> {
        if self.is_exhausted() {
            Ok(())
        } else {
            Err(UnpackError::ExcessMemory {
                offset: self.cursor,
                leftover: self.tail().to_vec(),
                dump: None,
            })
        }
    }
}
