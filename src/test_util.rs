#![forbid(unsafe_code)]

//! Fixtures shared by the unit tests. Both `.bz2` files were produced by the
//! reference `bzip2` encoder.

pub const HELLO: &[u8] = include_bytes!("../testdata/hello.bz2");

/// `sample_text(250_000)` compressed with `-1`, giving three data blocks.
pub const THREE_BLOCKS: &[u8] = include_bytes!("../testdata/three_blocks.bz2");

/// `run_sample()` compressed with `-1`: long runs of single bytes, so the
/// RUNA/RUNB codes and the four-byte repeat counts are all exercised.
pub const RUNS: &[u8] = include_bytes!("../testdata/runs.bz2");

/// `binary_sample()` compressed with `-1`; every byte value is in the map.
pub const BINARY: &[u8] = include_bytes!("../testdata/binary.bz2");

pub const EMPTY: &[u8] = &[
    0x42, 0x5a, 0x68, 0x39, 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0x00, 0x00, 0x00, 0x00,
];

pub fn sample_text(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 64);
    let mut line = 0;
    while out.len() < len {
        let tail = &"abcdefghij"[line % 10..];
        let text = format!("line {} of the sample text, {}\n", line % 997, tail);
        out.extend_from_slice(text.as_bytes());
        line += 1;
    }
    out.truncate(len);
    out
}

pub fn run_sample() -> Vec<u8> {
    let mut out = b"start ".to_vec();
    for (byte, count) in [(b'c', 300), (b'x', 1000), (0, 260), (b'e', 8)] {
        out.resize(out.len() + count, byte);
    }
    for _ in 0..50 {
        out.extend_from_slice(b"aaaab");
    }
    out.extend_from_slice(b"zzzzzqqqq end\n");
    out
}

/// Fifty copies of every byte value followed by 20000 bytes from a 31-bit LCG.
pub fn binary_sample() -> Vec<u8> {
    let mut out: Vec<u8> = (0..50).flat_map(|_| 0..=255u8).collect();
    let mut state = 1u32;
    for _ in 0..20_000 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345) & 0x7fff_ffff;
        out.push((state >> 16) as u8);
    }
    out
}

/// Packs `(value, width)` fields MSB-first, zero padded to a byte boundary.
pub fn pack_bits(fields: &[(u64, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc = 0u64;
    let mut count = 0u8;
    for &(value, width) in fields {
        for bit in (0..width).rev() {
            acc = (acc << 1) | ((value >> bit) & 1);
            count += 1;
            if count == 8 {
                out.push(acc as u8);
                acc = 0;
                count = 0;
            }
        }
    }
    if count > 0 {
        out.push((acc << (8 - count)) as u8);
    }
    out
}

/// Bit offsets of every occurrence of a 48-bit block magic.
pub fn find_magic(data: &[u8], magic: u64) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut window = 0u64;
    for bit in 0..data.len() * 8 {
        let value = (data[bit / 8] >> (7 - bit % 8)) & 1;
        window = ((window << 1) | u64::from(value)) & ((1 << 48) - 1);
        if bit >= 47 && window == magic {
            offsets.push(bit - 47);
        }
    }
    offsets
}

pub fn flip_bit(data: &mut [u8], bit: usize) {
    data[bit / 8] ^= 0x80 >> (bit % 8);
}
