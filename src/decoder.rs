#![forbid(unsafe_code)]

use std::io::{self, BufRead, Read, Write};

use byteorder::ReadBytesExt;
use log::*;

use crate::bit_reader::BitReader;
use crate::block_header::{BlockHeader, BlockMarker};
use crate::bwt::SuccessorChain;
use crate::error::{DecodeError, Result};
use crate::output::{combine_crc, OutputEngine};
use crate::symbol_decoder;

////////////////////////////////////////////////////////////////////////////////

const STREAM_MAGIC: &[u8; 3] = b"BZh";
/// Decompressed bytes per unit of the block-size digit.
const BLOCK_UNIT: usize = 100_000;
const IOBUF_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    ReadingBlockHeader,
    EmittingOutput,
    Done,
    Failed,
}

////////////////////////////////////////////////////////////////////////////////

/// Decoder for a single bzip2 stream.
///
/// Block headers, symbol decoding and the inverse BWT always run to completion
/// for a whole block; only the output side is resumable, so [`read`] can hand
/// out a block in pieces of any size.
///
/// A failed checksum is reported after the bytes of the offending block have
/// been returned: the `read` that reaches the end of the block returns what it
/// produced, and the next call returns the error.
///
/// [`read`]: BunzipReader::read
pub struct BunzipReader<R> {
    bit_reader: BitReader<R>,
    block_size: usize,
    header: BlockHeader,
    chain: SuccessorChain,
    engine: OutputEngine,
    total_crc: u32,
    block_count: usize,
    phase: Phase,
    pending_error: Option<DecodeError>,
    staging: Vec<u8>,
}

impl<R: BufRead> BunzipReader<R> {
    /// Check the stream header and allocate block buffers for the declared
    /// block size.
    pub fn new(mut source: R) -> Result<Self> {
        info!("parsing bzip2 header");
        let block_size = Self::parse_header(&mut source)?;
        debug!("block size:\t{}", block_size);

        Ok(Self {
            bit_reader: BitReader::new(source),
            block_size,
            header: BlockHeader::default(),
            chain: SuccessorChain::with_capacity(block_size),
            engine: OutputEngine::default(),
            total_crc: 0,
            block_count: 0,
            phase: Phase::ReadingBlockHeader,
            pending_error: None,
            staging: vec![0; IOBUF_SIZE],
        })
    }

    fn parse_header(source: &mut R) -> Result<usize> {
        let mut magic = [0u8; 3];
        for byte in magic.iter_mut() {
            *byte = Self::header_byte(source)?;
        }
        if &magic != STREAM_MAGIC {
            return Err(DecodeError::NotBzipData);
        }

        let digit = Self::header_byte(source)?;
        if !(b'1'..=b'9').contains(&digit) {
            return Err(DecodeError::NotBzipData);
        }
        Ok(usize::from(digit - b'0') * BLOCK_UNIT)
    }

    fn header_byte(source: &mut R) -> Result<u8> {
        source.read_u8().map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::NotBzipData,
            _ => DecodeError::Io(err),
        })
    }

    /// Maximum number of symbols in one block of this stream.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Combined checksum of the blocks finished so far.
    pub fn stream_crc(&self) -> u32 {
        self.total_crc
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Give back the input, positioned on the byte after the end-of-stream
    /// marker once the stream is finished.
    pub fn into_inner(self) -> R {
        self.bit_reader.into_inner()
    }

    /// Fill `out` with decompressed bytes. `Ok(0)` for a non-empty `out` means
    /// the stream ended and its combined checksum matched.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        self.fill(out)
    }

    /// Decompress everything that is left into `output`, returning the number
    /// of bytes written.
    pub fn drain_to<W: Write>(&mut self, mut output: W) -> Result<u64> {
        let mut staging = std::mem::take(&mut self.staging);
        let result = self.drain_with(&mut staging, &mut output);
        self.staging = staging;
        result
    }

    fn drain_with<W: Write>(&mut self, staging: &mut [u8], output: &mut W) -> Result<u64> {
        let mut total = 0;
        loop {
            let len = self.fill(staging)?;
            if len == 0 {
                break;
            }
            output.write_all(&staging[..len])?;
            total += len as u64;
        }
        output.flush()?;
        Ok(total)
    }

    fn fill(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut written = 0;
        while written < out.len() {
            let step = match self.phase {
                Phase::Done => break,
                Phase::Failed => {
                    return Err(self
                        .pending_error
                        .take()
                        .unwrap_or(DecodeError::DataError("stream already failed")));
                }
                Phase::ReadingBlockHeader => self.next_block(),
                Phase::EmittingOutput => {
                    written += self.engine.produce(&self.chain, &mut out[written..]);
                    if self.engine.is_finished() {
                        self.finish_block()
                    } else {
                        Ok(())
                    }
                }
            };

            if let Err(err) = step {
                self.phase = Phase::Failed;
                if written == 0 {
                    return Err(err);
                }
                self.pending_error = Some(err);
                break;
            }
        }
        Ok(written)
    }

    fn next_block(&mut self) -> Result<()> {
        info!("reading block header");
        match self.header.parse(&mut self.bit_reader, self.block_size)? {
            BlockMarker::EndOfStream { combined_crc } => {
                if combined_crc != self.total_crc {
                    return Err(DecodeError::CrcMismatch {
                        expected: combined_crc,
                        computed: self.total_crc,
                    });
                }
                info!("end of stream after {} blocks", self.block_count);
                self.phase = Phase::Done;
            }
            BlockMarker::Data => {
                self.block_count += 1;
                info!("decoding block {}", self.block_count);
                let byte_counts = symbol_decoder::decode_symbols(
                    &mut self.bit_reader,
                    &self.header,
                    &mut self.chain,
                )?;
                self.chain.invert(self.header.orig_ptr, &byte_counts)?;
                self.engine.start(&self.chain, self.header.block_crc);
                self.phase = Phase::EmittingOutput;
            }
        }
        Ok(())
    }

    fn finish_block(&mut self) -> Result<()> {
        let block_crc = self.engine.finish()?;
        self.total_crc = combine_crc(self.total_crc, block_crc);
        self.phase = Phase::ReadingBlockHeader;
        Ok(())
    }
}

impl<R: BufRead> Read for BunzipReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf).map_err(io::Error::from)
    }
}

////////////////////////////////////////////////////////////////////////////////
