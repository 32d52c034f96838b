#![forbid(unsafe_code)]

use std::io::BufRead;

use log::*;

use crate::bit_reader::BitReader;
use crate::error::{DecodeError, Result};

////////////////////////////////////////////////////////////////////////////////

pub const MAX_HUFCODE_BITS: usize = 20;
/// 256 literals plus RUNA and RUNB.
pub const MAX_SYMBOLS: usize = 258;

/// Canonical Huffman decoding table for one coding group.
///
/// `permute` lists symbols ordered by code length (ties by symbol value).
/// `limit[len]` is the largest code value of length `len`, and
/// `code - base[len]` is the index into `permute` of a code of that length.
#[derive(Clone)]
pub struct GroupTable {
    min_len: u8,
    max_len: u8,
    limit: [i32; MAX_HUFCODE_BITS + 1],
    base: [i32; MAX_HUFCODE_BITS + 1],
    permute: [u16; MAX_SYMBOLS],
    symbol_count: usize,
}

impl Default for GroupTable {
    fn default() -> Self {
        Self {
            min_len: 1,
            max_len: 1,
            limit: [-1; MAX_HUFCODE_BITS + 1],
            base: [0; MAX_HUFCODE_BITS + 1],
            permute: [0; MAX_SYMBOLS],
            symbol_count: 0,
        }
    }
}

impl GroupTable {
    #[cfg(test)]
    pub fn from_lengths(code_lengths: &[u8]) -> Result<Self> {
        let mut table = Self::default();
        table.rebuild(code_lengths)?;
        Ok(table)
    }

    /// Recompute the table in place from per-symbol code lengths.
    pub fn rebuild(&mut self, code_lengths: &[u8]) -> Result<()> {
        if code_lengths.is_empty() || code_lengths.len() > MAX_SYMBOLS {
            return Err(DecodeError::DataError("bad huffman symbol count"));
        }
        let min_len = *code_lengths.iter().min().unwrap_or(&0);
        let max_len = *code_lengths.iter().max().unwrap_or(&0);
        if min_len < 1 || usize::from(max_len) > MAX_HUFCODE_BITS {
            return Err(DecodeError::DataError("huffman code length out of range"));
        }

        let mut pos = 0;
        for len in min_len..=max_len {
            for (symbol, &symbol_len) in code_lengths.iter().enumerate() {
                if symbol_len == len {
                    self.permute[pos] = symbol as u16;
                    pos += 1;
                }
            }
        }

        let mut bl_count = [0i32; MAX_HUFCODE_BITS + 1];
        for &len in code_lengths {
            bl_count[usize::from(len)] += 1;
        }
        trace!("bl_count: {:?}", &bl_count[usize::from(min_len)..=usize::from(max_len)]);

        self.limit = [-1; MAX_HUFCODE_BITS + 1];
        self.base = [0; MAX_HUFCODE_BITS + 1];

        let (min, max) = (usize::from(min_len), usize::from(max_len));
        let mut code = 0i32;
        let mut coded = 0i32;
        for len in min..max {
            code += bl_count[len];
            self.limit[len] = code - 1;
            code <<= 1;
            coded += bl_count[len];
            self.base[len + 1] = code - coded;
        }
        self.limit[max] = code + bl_count[max] - 1;
        self.base[min] = 0;

        self.min_len = min_len;
        self.max_len = max_len;
        self.symbol_count = code_lengths.len();
        Ok(())
    }

    pub fn min_len(&self) -> u8 {
        self.min_len
    }

    pub fn max_len(&self) -> u8 {
        self.max_len
    }

    pub fn read_symbol<T: BufRead>(&self, bit_reader: &mut BitReader<T>) -> Result<u16> {
        let mut len = self.min_len;
        let mut code = bit_reader.read_bits(len)? as i32;
        while code > self.limit[usize::from(len)] {
            len += 1;
            if len > self.max_len {
                return Err(DecodeError::DataError("huffman code too long"));
            }
            code = (code << 1) | i32::from(bit_reader.read_bit()?);
        }

        let index = code - self.base[usize::from(len)];
        if index < 0 || index as usize >= self.symbol_count {
            return Err(DecodeError::DataError("huffman symbol out of range"));
        }
        Ok(self.permute[index as usize])
    }
}

////////////////////////////////////////////////////////////////////////////////
