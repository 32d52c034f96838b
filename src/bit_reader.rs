#![forbid(unsafe_code)]

use std::io::{self, BufRead};

////////////////////////////////////////////////////////////////////////////////

/// Reads MSB-first bit fields, the order bzip2 packs everything in.
///
/// Bytes are pulled into the accumulator one at a time and only when a request
/// cannot be satisfied from what is already buffered, so between calls fewer
/// than 8 bits are ever held back from the underlying stream.
pub struct BitReader<T> {
    stream: T,
    bits: u64,
    bit_count: u8,
}

impl<T: BufRead> BitReader<T> {
    pub fn new(stream: T) -> Self {
        Self {
            stream,
            bits: 0,
            bit_count: 0,
        }
    }

    pub fn read_bits(&mut self, len: u8) -> io::Result<u32> {
        assert!(len <= 32 && len != 0);
        while self.bit_count < len {
            let byte = self.next_byte()?;
            self.bits = (self.bits << 8) | u64::from(byte);
            self.bit_count += 8;
        }

        self.bit_count -= len;
        let value = (self.bits >> self.bit_count) & ((1u64 << len) - 1);
        self.bits &= (1u64 << self.bit_count) - 1;
        Ok(value as u32)
    }

    pub fn read_bit(&mut self) -> io::Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Drop the unread bits of the current byte and give back the byte stream.
    pub fn into_inner(self) -> T {
        self.stream
    }

    fn next_byte(&mut self) -> io::Result<u8> {
        let buf = self.stream.fill_buf()?;
        let byte = *buf.first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "bzip2 stream ended early")
        })?;
        self.stream.consume(1);
        Ok(byte)
    }
}

////////////////////////////////////////////////////////////////////////////////
