//! Widened in-register representation of column values.

use std::fmt::Debug;
use std::hash::Hash;

/// Integer a column value is widened into for comparison: `i64` for widths up
/// to 8 bytes, `i128` for 16-byte columns.
pub trait Lane: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    const WIDTH: usize;

    /// Widen `W` stored bytes, sign- or zero-extending.
    fn read<const W: usize>(bytes: &[u8], signed: bool) -> Self;

    /// Widen the low `width` bytes of a sentinel bit pattern.
    fn from_pattern(bits: u128, width: usize, signed: bool) -> Self;

    fn to_i128(self) -> i128;
}

impl Lane for i64 {
    const WIDTH: usize = 8;

    #[inline(always)]
    fn read<const W: usize>(bytes: &[u8], signed: bool) -> Self {
        let mut raw = [0u8; 8];
        raw[..W].copy_from_slice(&bytes[..W]);
        let v = u64::from_le_bytes(raw);
        if W == 8 || !signed {
            return v as i64;
        }
        let shift = 64 - 8 * W as u32;
        ((v << shift) as i64) >> shift
    }

    fn from_pattern(bits: u128, width: usize, signed: bool) -> Self {
        colblk_types::codecs::widen_le(&bits.to_le_bytes()[..width], signed)
    }

    #[inline(always)]
    fn to_i128(self) -> i128 {
        self as i128
    }
}

impl Lane for i128 {
    const WIDTH: usize = 16;

    #[inline(always)]
    fn read<const W: usize>(bytes: &[u8], _signed: bool) -> Self {
        let mut raw = [0u8; 16];
        raw[..W].copy_from_slice(&bytes[..W]);
        i128::from_le_bytes(raw)
    }

    fn from_pattern(bits: u128, _width: usize, _signed: bool) -> Self {
        bits as i128
    }

    #[inline(always)]
    fn to_i128(self) -> i128 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_reads_extend() {
        assert_eq!(<i64 as Lane>::read::<2>(&[0xFE, 0xFF], true), -2);
        assert_eq!(<i64 as Lane>::read::<2>(&[0xFE, 0xFF], false), 0xFFFE);
        assert_eq!(<i64 as Lane>::read::<4>(&7i32.to_le_bytes(), true), 7);
        assert_eq!(i64::from_pattern(0x80, 1, true), -128);
    }

    #[test]
    fn wide_reads_verbatim() {
        let v = -12345678901234567890123456789i128;
        assert_eq!(<i128 as Lane>::read::<16>(&v.to_le_bytes(), true), v);
    }
}
