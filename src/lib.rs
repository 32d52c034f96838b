#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use log::*;

pub use crate::decoder::BunzipReader;
pub use crate::error::{DecodeError, Result};

mod bit_reader;
mod block_header;
mod bwt;
mod decoder;
mod error;
mod huffman_coding;
mod output;
mod symbol_decoder;

#[cfg(test)]
mod test_util;

/// Decompress every bzip2 stream in `input` into `output`, returning the number
/// of bytes written. Bytes after the last stream that do not start another one
/// are ignored with a warning.
pub fn decompress<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<u64> {
    let mut total = 0;
    let mut streams = 0;
    while !input.fill_buf()?.is_empty() {
        let mut reader = match BunzipReader::new(&mut input) {
            Ok(reader) => reader,
            Err(DecodeError::NotBzipData) if streams > 0 => {
                warn!("trailing garbage after bzip2 data ignored");
                break;
            }
            Err(err) => return Err(err),
        };
        total += reader.drain_to(&mut output)?;
        streams += 1;
        debug!("stream {} done, {} bytes so far", streams, total);
    }
    if streams == 0 {
        return Err(DecodeError::NotBzipData);
    }
    Ok(total)
}

////////////////////////////////////////////////////////////////////////////////
