#![forbid(unsafe_code)]

use std::io::BufRead;

use log::*;

use crate::bit_reader::BitReader;
use crate::error::{DecodeError, Result};
use crate::huffman_coding::{GroupTable, MAX_HUFCODE_BITS, MAX_SYMBOLS};

////////////////////////////////////////////////////////////////////////////////

/// BCD digits of pi.
pub(crate) const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
/// BCD digits of sqrt(pi).
pub(crate) const END_OF_STREAM_MAGIC: u64 = 0x1772_4538_5090;

pub const MAX_GROUPS: usize = 6;
const MIN_GROUPS: usize = 2;

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, PartialEq, Eq)]
pub enum BlockMarker {
    Data,
    EndOfStream { combined_crc: u32 },
}

/// Everything a data block declares before its symbol stream:
///
/// ```text
/// 48 bits  block magic
/// 32 bits  block crc
///  1 bit   randomized (obsolete)
/// 24 bits  origin pointer
/// 16 bits  bitmap of used 16-byte ranges, then 16 bits per set bit
///  3 bits  group count
/// 15 bits  selector count, then unary MTF-coded selectors
///          per group: 5 bit start length + 2-bit deltas per symbol
/// ```
///
/// One instance lives for the whole stream and is refilled for every block.
pub struct BlockHeader {
    pub block_crc: u32,
    pub orig_ptr: usize,
    pub sym_to_byte: [u8; 256],
    pub sym_total: usize,
    pub selectors: Vec<u8>,
    groups: Vec<GroupTable>,
    group_count: usize,
    lengths: Vec<u8>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            block_crc: 0,
            orig_ptr: 0,
            sym_to_byte: [0; 256],
            sym_total: 0,
            selectors: Vec::new(),
            groups: vec![GroupTable::default(); MAX_GROUPS],
            group_count: 0,
            lengths: Vec::with_capacity(MAX_SYMBOLS),
        }
    }
}

impl BlockHeader {
    /// Huffman tables in use by the current block.
    pub fn groups(&self) -> &[GroupTable] {
        &self.groups[..self.group_count]
    }

    pub fn parse<T: BufRead>(
        &mut self,
        bit_reader: &mut BitReader<T>,
        capacity: usize,
    ) -> Result<BlockMarker> {
        let high = u64::from(bit_reader.read_bits(24)?);
        let magic = (high << 24) | u64::from(bit_reader.read_bits(24)?);
        let crc = bit_reader.read_bits(32)?;
        match magic {
            END_OF_STREAM_MAGIC => {
                debug!("stream crc:\t{:#010x}", crc);
                return Ok(BlockMarker::EndOfStream { combined_crc: crc });
            }
            BLOCK_MAGIC => {}
            _ => return Err(DecodeError::NotBzipData),
        }
        self.block_crc = crc;
        debug!("block crc:\t{:#010x}", crc);

        if bit_reader.read_bit()? {
            return Err(DecodeError::ObsoleteFormat);
        }

        self.orig_ptr = bit_reader.read_bits(24)? as usize;
        debug!("origPtr:\t{}", self.orig_ptr);
        if self.orig_ptr > capacity {
            return Err(DecodeError::DataError("origin pointer beyond block size"));
        }

        self.read_symbol_map(bit_reader)?;
        self.read_selectors(bit_reader)?;
        self.read_tables(bit_reader)?;
        Ok(BlockMarker::Data)
    }

    fn read_symbol_map<T: BufRead>(&mut self, bit_reader: &mut BitReader<T>) -> Result<()> {
        let used_ranges = bit_reader.read_bits(16)?;
        self.sym_total = 0;
        for range in 0..16 {
            if used_ranges & (1 << (15 - range)) == 0 {
                continue;
            }
            let used = bit_reader.read_bits(16)?;
            for offset in 0..16 {
                if used & (1 << (15 - offset)) != 0 {
                    self.sym_to_byte[self.sym_total] = (16 * range + offset) as u8;
                    self.sym_total += 1;
                }
            }
        }
        debug!("symbols in use:\t{}", self.sym_total);
        if self.sym_total == 0 {
            return Err(DecodeError::DataError("block uses no byte values"));
        }
        Ok(())
    }

    fn read_selectors<T: BufRead>(&mut self, bit_reader: &mut BitReader<T>) -> Result<()> {
        self.group_count = bit_reader.read_bits(3)? as usize;
        debug!("groups:\t{}", self.group_count);
        if !(MIN_GROUPS..=MAX_GROUPS).contains(&self.group_count) {
            return Err(DecodeError::DataError("bad huffman group count"));
        }

        let selector_count = bit_reader.read_bits(15)? as usize;
        debug!("selectors:\t{}", selector_count);
        if selector_count == 0 {
            return Err(DecodeError::DataError("no selectors"));
        }

        let mut mtf = [0u8, 1, 2, 3, 4, 5];
        self.selectors.clear();
        for _ in 0..selector_count {
            let mut index = 0;
            while bit_reader.read_bit()? {
                index += 1;
                if index >= self.group_count {
                    return Err(DecodeError::DataError("selector out of range"));
                }
            }
            let group = mtf[index];
            mtf.copy_within(0..index, 1);
            mtf[0] = group;
            self.selectors.push(group);
        }
        Ok(())
    }

    fn read_tables<T: BufRead>(&mut self, bit_reader: &mut BitReader<T>) -> Result<()> {
        // Literals plus RUNA and RUNB; the end-of-block symbol replaces the
        // first literal, which is always coded as a run instead.
        let symbol_count = self.sym_total + 2;
        for group in 0..self.group_count {
            self.lengths.clear();
            let mut len = bit_reader.read_bits(5)? as usize;
            for _ in 0..symbol_count {
                loop {
                    if !(1..=MAX_HUFCODE_BITS).contains(&len) {
                        return Err(DecodeError::DataError("huffman code length out of range"));
                    }
                    if !bit_reader.read_bit()? {
                        break;
                    }
                    if bit_reader.read_bit()? {
                        len -= 1;
                    } else {
                        len += 1;
                    }
                }
                self.lengths.push(len as u8);
            }
            let table = &mut self.groups[group];
            table.rebuild(&self.lengths)?;
            trace!(
                "group {}: code lengths {}..={}, {:?}",
                group,
                table.min_len(),
                table.max_len(),
                self.lengths
            );
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
