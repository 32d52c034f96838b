#![forbid(unsafe_code)]

use std::io::BufRead;
use std::slice;

use log::*;

use crate::bit_reader::BitReader;
use crate::block_header::BlockHeader;
use crate::bwt::{ByteCounts, SuccessorChain};
use crate::error::{DecodeError, Result};
use crate::huffman_coding::GroupTable;

////////////////////////////////////////////////////////////////////////////////

/// Symbols coded with one table before switching to the next selector.
const GROUP_SIZE: usize = 50;

const SYMBOL_RUNA: u16 = 0;
const SYMBOL_RUNB: u16 = 1;

////////////////////////////////////////////////////////////////////////////////

/// Undo Huffman coding, RUNA/RUNB run lengths and move-to-front for one
/// block, filling `chain` with the BWT last column.
pub fn decode_symbols<T: BufRead>(
    bit_reader: &mut BitReader<T>,
    header: &BlockHeader,
    chain: &mut SuccessorChain,
) -> Result<ByteCounts> {
    chain.clear();
    let mut byte_counts: ByteCounts = [0; 256];
    let mut mtf: [u8; 256] = std::array::from_fn(|i| i as u8);

    let mut selectors = header.selectors.iter();
    let mut table = next_table(header.groups(), &mut selectors)?;
    let mut left_in_group = GROUP_SIZE;

    let mut run_pos = 0usize;
    let mut run_len = 0usize;
    loop {
        if left_in_group == 0 {
            table = next_table(header.groups(), &mut selectors)?;
            left_in_group = GROUP_SIZE;
        }
        left_in_group -= 1;

        let symbol = table.read_symbol(bit_reader)?;
        if symbol <= SYMBOL_RUNB {
            // Bijective base 2: RUNA adds run_pos, RUNB adds twice that.
            if run_pos == 0 {
                run_pos = 1;
                run_len = 0;
            }
            if run_pos > chain.capacity() {
                return Err(DecodeError::DataError("run length overflow"));
            }
            run_len += run_pos << symbol;
            run_pos <<= 1;
            continue;
        }

        if run_pos != 0 {
            run_pos = 0;
            let byte = header.sym_to_byte[usize::from(mtf[0])];
            chain.push_run(byte, run_len)?;
            byte_counts[usize::from(byte)] += run_len as u32;
        }

        if usize::from(symbol) > header.sym_total {
            break;
        }

        // MTF position 0 is always sent as a run, so literals start at 1.
        let index = usize::from(symbol - 1);
        let entry = mtf[index];
        mtf.copy_within(0..index, 1);
        mtf[0] = entry;

        let byte = header.sym_to_byte[usize::from(entry)];
        chain.push(byte)?;
        byte_counts[usize::from(byte)] += 1;
    }

    debug!("decoded {} symbols", chain.len());
    Ok(byte_counts)
}

fn next_table<'a>(
    groups: &'a [GroupTable],
    selectors: &mut slice::Iter<'_, u8>,
) -> Result<&'a GroupTable> {
    let selector = selectors
        .next()
        .ok_or(DecodeError::DataError("ran out of selectors"))?;
    groups
        .get(usize::from(*selector))
        .ok_or(DecodeError::DataError("selector names a missing group"))
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_header::{BlockMarker, BLOCK_MAGIC};
    use crate::test_util::{pack_bits, HELLO};

    /// Block over the bytes 'a' and 'b' with two flat tables, so every
    /// symbol (RUNA, RUNB, MTF1, EOB) is its own 2-bit value.
    fn flat_block(selector_count: u64, symbols: &[u64]) -> Vec<u8> {
        let mut fields = vec![
            (BLOCK_MAGIC, 48),
            (0, 32),
            (0, 1),
            (0, 24),
            (1 << (15 - 6), 16),
            (0b0110_0000_0000_0000, 16),
            (2, 3),
            (selector_count, 15),
        ];
        fields.extend((0..selector_count).map(|_| (0, 1)));
        for _ in 0..2 {
            fields.push((2, 5));
            fields.extend([(0, 1); 4]);
        }
        fields.extend(symbols.iter().map(|&symbol| (symbol, 2)));
        pack_bits(&fields)
    }

    fn decode(data: &[u8], capacity: usize) -> Result<(SuccessorChain, ByteCounts)> {
        let mut reader = BitReader::new(data);
        let mut header = BlockHeader::default();
        assert_eq!(header.parse(&mut reader, capacity)?, BlockMarker::Data);
        let mut chain = SuccessorChain::with_capacity(capacity);
        let counts = decode_symbols(&mut reader, &header, &mut chain)?;
        Ok((chain, counts))
    }

    #[test]
    fn runs_and_literals() -> Result<()> {
        // RUNB RUNA = 2 + 2 = 4 copies of 'a', then 'b', then RUNA (one more
        // 'b', now at the front), then end of block.
        let data = flat_block(1, &[1, 0, 2, 0, 3]);
        let (chain, counts) = decode(&data, 100)?;
        assert_eq!(chain.len(), 6);
        assert_eq!(counts[usize::from(b'a')], 4);
        assert_eq!(counts[usize::from(b'b')], 2);
        Ok(())
    }

    #[test]
    fn ran_out_of_selectors() {
        let data = flat_block(1, &[2; 51]);
        assert!(matches!(
            decode(&data, 100),
            Err(DecodeError::DataError("ran out of selectors"))
        ));
    }

    #[test]
    fn second_selector_is_used() -> Result<()> {
        let mut symbols = vec![2; 50];
        symbols.push(3);
        let data = flat_block(2, &symbols);
        let (chain, counts) = decode(&data, 100)?;
        assert_eq!(chain.len(), 50);
        assert_eq!(counts[usize::from(b'a')] + counts[usize::from(b'b')], 50);
        Ok(())
    }

    #[test]
    fn run_overflows_block() {
        // Five RUNBs describe 62 copies, more than a 40 byte block holds.
        let data = flat_block(1, &[1, 1, 1, 1, 1, 3]);
        assert!(matches!(decode(&data, 40), Err(DecodeError::DataError(_))));

        let data = flat_block(1, &[1, 1, 1, 1, 1, 1, 1, 3]);
        assert!(matches!(
            decode(&data, 40),
            Err(DecodeError::DataError("run length overflow"))
        ));
    }

    #[test]
    fn literals_overflow_block() {
        let data = flat_block(1, &[2, 2, 2, 2, 3]);
        assert!(matches!(decode(&data, 3), Err(DecodeError::DataError(_))));
    }

    #[test]
    fn hello_world_symbols() -> Result<()> {
        let (chain, counts) = decode(&HELLO[4..], 900_000)?;
        assert_eq!(chain.len(), 11);
        assert_eq!(counts[usize::from(b'l')], 3);
        assert_eq!(counts[usize::from(b'o')], 2);
        assert_eq!(counts[usize::from(b' ')], 1);
        assert_eq!(counts.iter().sum::<u32>(), 11);
        Ok(())
    }
}
