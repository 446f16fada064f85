//! Bit interleaving between face-local `(x, y)` and the in-face part of a nested id.
//!
//! Even bits of the interleaved value carry `x`, odd bits carry `y`.

const fn build_spread() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut v = 0u16;
        let mut b = 0;
        while b < 8 {
            if i & (1 << b) != 0 {
                v |= 1 << (2 * b);
            }
            b += 1;
        }
        table[i] = v;
        i += 1;
    }
    table
}

const fn build_compress() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut v = 0u8;
        let mut b = 0;
        while b < 4 {
            if i & (1 << (2 * b)) != 0 {
                v |= 1 << b;
            }
            b += 1;
        }
        table[i] = v;
        i += 1;
    }
    table
}

/// Byte -> 16 bits with a zero inserted above every input bit.
static SPREAD: [u16; 256] = build_spread();
/// Even bits of a byte packed into a nibble.
static COMPRESS: [u8; 256] = build_compress();

pub fn spread_bits(v: u32) -> u64 {
    u64::from(SPREAD[(v & 0xff) as usize])
        | u64::from(SPREAD[((v >> 8) & 0xff) as usize]) << 16
        | u64::from(SPREAD[((v >> 16) & 0xff) as usize]) << 32
        | u64::from(SPREAD[((v >> 24) & 0xff) as usize]) << 48
}

pub fn compress_bits(v: u64) -> u32 {
    let mut out = 0u32;
    for k in 0..8 {
        let byte = ((v >> (8 * k)) & 0xff) as usize;
        out |= u32::from(COMPRESS[byte]) << (4 * k);
    }
    out
}

pub fn interleave(x: u32, y: u32) -> u64 {
    spread_bits(x) | spread_bits(y) << 1
}

pub fn deinterleave(v: u64) -> (u32, u32) {
    (compress_bits(v), compress_bits(v >> 1))
}
