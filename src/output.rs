#![forbid(unsafe_code)]

use crc::{Crc, Digest};
use log::*;

use crate::bwt::SuccessorChain;
use crate::error::{DecodeError, Result};

////////////////////////////////////////////////////////////////////////////////

/// Four equal bytes in a row are followed by a count of further copies.
const RUN_THRESHOLD: u8 = 4;

static CRC: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_BZIP2);

/// Walks a [`SuccessorChain`], expanding the final run-length stage, and can
/// stop after any byte and pick up where it left off.
pub struct OutputEngine {
    pos: u32,
    current: Option<u8>,
    run: u8,
    remaining: usize,
    repeat_byte: u8,
    repeat_left: usize,
    expected_crc: u32,
    digest: Digest<'static, u32>,
}

impl Default for OutputEngine {
    fn default() -> Self {
        Self {
            pos: 0,
            current: None,
            run: 0,
            remaining: 0,
            repeat_byte: 0,
            repeat_left: 0,
            expected_crc: 0,
            digest: CRC.digest(),
        }
    }
}

impl OutputEngine {
    /// Prime the walk for a freshly inverted block.
    pub fn start(&mut self, chain: &SuccessorChain, expected_crc: u32) {
        let (_, first) = chain.head();
        *self = Self {
            pos: first,
            remaining: chain.len(),
            expected_crc,
            ..Self::default()
        };
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0 && self.repeat_left == 0
    }

    /// Write up to `out.len()` bytes of the block, returning how many.
    pub fn produce(&mut self, chain: &SuccessorChain, out: &mut [u8]) -> usize {
        let mut written = 0;
        while written < out.len() {
            if self.repeat_left > 0 {
                let count = self.repeat_left.min(out.len() - written);
                out[written..written + count].fill(self.repeat_byte);
                written += count;
                self.repeat_left -= count;
                continue;
            }
            if self.remaining == 0 {
                break;
            }

            let (byte, next) = chain.step(self.pos);
            self.pos = next;
            self.remaining -= 1;

            if self.run == RUN_THRESHOLD {
                self.repeat_left = usize::from(byte);
                self.run = 0;
                self.current = None;
                continue;
            }

            if self.current == Some(byte) {
                self.run += 1;
            } else {
                self.current = Some(byte);
                self.run = 1;
            }
            self.repeat_byte = byte;
            out[written] = byte;
            written += 1;
        }
        self.digest.update(&out[..written]);
        written
    }

    /// Check the block checksum once every byte has been produced.
    pub fn finish(&mut self) -> Result<u32> {
        debug_assert!(self.is_finished());
        let computed = std::mem::replace(&mut self.digest, CRC.digest()).finalize();
        if computed != self.expected_crc {
            warn!(
                "block crc mismatch: stored {:#010x}, computed {:#010x}",
                self.expected_crc, computed
            );
            return Err(DecodeError::CrcMismatch {
                expected: self.expected_crc,
                computed,
            });
        }
        Ok(computed)
    }
}

/// Fold a block checksum into the running stream checksum.
pub fn combine_crc(total: u32, block_crc: u32) -> u32 {
    total.rotate_left(1) ^ block_crc
}

////////////////////////////////////////////////////////////////////////////////
