//! Reserved NULL/EMPTY bit patterns keyed by (width, logical type).
//!
//! Narrow columns reserve different patterns per comparison family. Character
//! patterns are the exception: they are keyed on the logical type, so temporal
//! and binary columns can carry them while comparing as integers. All 16-byte
//! types share [`WideInt::NULL`] and [`WideInt::EMPTY`].

use colblk_result::{Error, Result};

use crate::logical_type::{ColumnKind, LogicalType};
use crate::wide::WideInt;

/// Alternate NULL accepted for 8-byte character-patterned columns written by
/// older releases.
pub const TEXT8_ALT_NULL: u64 = 0xFFFF_FFFF_FFFF_FFFE;

/// NULL and EMPTY patterns for one column layout.
///
/// Patterns are stored as the column's raw little-endian bits in the low
/// `width` bytes of a `u128`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SentinelPair {
    pub width: usize,
    pub null: u128,
    pub empty: u128,
    /// Second NULL encoding, present only for 8-byte character patterns.
    pub alt_null: Option<u128>,
}

impl SentinelPair {
    const fn narrow(width: usize, null: u64, empty: u64) -> Self {
        Self {
            width,
            null: null as u128,
            empty: empty as u128,
            alt_null: None,
        }
    }

    /// NULL pattern as it appears in a block.
    pub fn null_bytes(&self) -> Vec<u8> {
        self.null.to_le_bytes()[..self.width].to_vec()
    }

    /// EMPTY pattern as it appears in a block.
    pub fn empty_bytes(&self) -> Vec<u8> {
        self.empty.to_le_bytes()[..self.width].to_vec()
    }

    #[inline]
    pub fn is_null_bits(&self, bits: u128) -> bool {
        bits == self.null || self.alt_null == Some(bits)
    }

    #[inline]
    pub fn is_empty_bits(&self, bits: u128) -> bool {
        bits == self.empty
    }
}

/// Whether a column of this width stores the character NULL/EMPTY patterns.
///
/// Temporal columns switch to the character patterns at every width but 4,
/// where their NULL coincides with the unsigned one. VARBINARY only does so at
/// 8 bytes.
fn char_patterned(width: usize, logical_type: LogicalType) -> bool {
    use LogicalType::*;
    match logical_type {
        Char | VarChar | Text | Blob => true,
        VarBinary => width == 8,
        Date | DateTime | Time | Timestamp => width != 4,
        _ => false,
    }
}

/// Look up the sentinel pair for a column layout.
pub fn sentinels(width: usize, logical_type: LogicalType) -> Result<SentinelPair> {
    if width == 16 {
        return Ok(SentinelPair {
            width,
            null: WideInt::NULL.0 as u128,
            empty: WideInt::EMPTY.0 as u128,
            alt_null: None,
        });
    }
    if char_patterned(width, logical_type) {
        let pair = match width {
            1 => SentinelPair::narrow(1, 0xFE, 0xFF),
            2 => SentinelPair::narrow(2, 0xFEFF, 0xFFFF),
            4 => SentinelPair::narrow(4, 0xFEFF_FFFF, 0xFFFF_FFFF),
            8 => SentinelPair {
                alt_null: Some(TEXT8_ALT_NULL as u128),
                ..SentinelPair::narrow(8, 0xFEFF_FFFF_FFFF_FFFF, 0xFFFF_FFFF_FFFF_FFFF)
            },
            _ => return Err(Error::unsupported_column(width, logical_type)),
        };
        return Ok(pair);
    }
    let pair = match (logical_type.kind(), width) {
        (ColumnKind::Signed, 1) => SentinelPair::narrow(1, 0x80, 0x81),
        (ColumnKind::Signed, 2) => SentinelPair::narrow(2, 0x8000, 0x8001),
        (ColumnKind::Signed, 4) => SentinelPair::narrow(4, 0x8000_0000, 0x8000_0001),
        (ColumnKind::Signed, 8) => {
            SentinelPair::narrow(8, 0x8000_0000_0000_0000, 0x8000_0000_0000_0001)
        }
        (ColumnKind::Unsigned, 1) => SentinelPair::narrow(1, 0xFE, 0xFF),
        (ColumnKind::Unsigned, 2) => SentinelPair::narrow(2, 0xFFFE, 0xFFFF),
        (ColumnKind::Unsigned, 4) => SentinelPair::narrow(4, 0xFFFF_FFFE, 0xFFFF_FFFF),
        (ColumnKind::Unsigned, 8) => {
            SentinelPair::narrow(8, 0xFFFF_FFFF_FFFF_FFFE, 0xFFFF_FFFF_FFFF_FFFF)
        }
        (ColumnKind::Float, 4) => SentinelPair::narrow(4, 0xFFAA_AAAA, 0xFFAA_AAAB),
        (ColumnKind::Float, 8) => {
            SentinelPair::narrow(8, 0xFFFA_AAAA_AAAA_AAAA, 0xFFFA_AAAA_AAAA_AAAB)
        }
        _ => return Err(Error::unsupported_column(width, logical_type)),
    };
    Ok(pair)
}
