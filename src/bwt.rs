#![forbid(unsafe_code)]

use log::*;

use crate::error::{DecodeError, Result};

////////////////////////////////////////////////////////////////////////////////

/// Occurrences of every byte value in a block.
pub type ByteCounts = [u32; 256];

/// The last column of the sorted rotation matrix, and after [`invert`] the
/// position that follows each entry in the original text.
///
/// Both arrays are allocated once at the stream's block size and reused for
/// every block.
///
/// [`invert`]: SuccessorChain::invert
pub struct SuccessorChain {
    bytes: Vec<u8>,
    next: Vec<u32>,
    capacity: usize,
    origin: usize,
}

impl SuccessorChain {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            next: Vec::with_capacity(capacity),
            capacity,
            origin: 0,
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.next.clear();
        self.origin = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.bytes.len() >= self.capacity {
            return Err(DecodeError::DataError("block overflows its declared size"));
        }
        self.bytes.push(byte);
        Ok(())
    }

    pub fn push_run(&mut self, byte: u8, count: usize) -> Result<()> {
        if count > self.capacity - self.bytes.len() {
            return Err(DecodeError::DataError("run overflows its declared size"));
        }
        self.bytes.resize(self.bytes.len() + count, byte);
        Ok(())
    }

    /// Link every position to its successor with a counting sort over
    /// `byte_counts`, which must describe exactly the bytes pushed so far.
    pub fn invert(&mut self, origin: usize, byte_counts: &ByteCounts) -> Result<()> {
        if self.is_empty() {
            return Err(DecodeError::DataError("block has no symbols"));
        }
        if origin >= self.bytes.len() {
            return Err(DecodeError::DataError("origin pointer beyond decoded data"));
        }
        self.origin = origin;

        let mut bucket_start = [0u32; 256];
        let mut total = 0u32;
        for (start, &count) in bucket_start.iter_mut().zip(byte_counts.iter()) {
            *start = total;
            total += count;
        }
        if total as usize != self.bytes.len() {
            return Err(DecodeError::DataError("byte counts disagree with block length"));
        }

        self.next.clear();
        self.next.resize(self.bytes.len(), 0);
        for (pos, &byte) in self.bytes.iter().enumerate() {
            let slot = &mut bucket_start[usize::from(byte)];
            self.next[*slot as usize] = pos as u32;
            *slot += 1;
        }
        trace!("inverted {} bytes from origin {}", self.bytes.len(), origin);
        Ok(())
    }

    /// The context byte preceding the text, which is never emitted, and the
    /// position of the first emitted byte.
    pub fn head(&self) -> (u8, u32) {
        (self.bytes[self.origin], self.next[self.origin])
    }

    /// The byte at `pos` and the position that follows it.
    pub fn step(&self, pos: u32) -> (u8, u32) {
        let pos = pos as usize;
        (self.bytes[pos], self.next[pos])
    }
}

////////////////////////////////////////////////////////////////////////////////
