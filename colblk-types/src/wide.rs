//! 128-bit signed integer payload used by wide decimal columns.

use std::fmt;

use colblk_result::{Error, Result};

/// Largest power of ten that fits in 64 bits.
const LIMB: u128 = 10_000_000_000_000_000_000;
const LIMB_DIGITS: usize = 19;

/// Powers of ten that fit in an `i128` (`10^0 ..= 10^38`).
pub const POW10: [i128; 39] = {
    let mut table = [1i128; 39];
    let mut i = 1;
    while i < 39 {
        table[i] = table[i - 1] * 10;
        i += 1;
    }
    table
};

/// A 128-bit two's-complement integer with reserved NULL/EMPTY patterns.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WideInt(pub i128);

impl WideInt {
    pub const NULL: WideInt = WideInt(i128::MIN);
    pub const EMPTY: WideInt = WideInt(i128::MIN + 1);
    /// Smallest value that is not a sentinel.
    pub const MIN_VALUE: WideInt = WideInt(i128::MIN + 2);
    pub const MAX_VALUE: WideInt = WideInt(i128::MAX);

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.is_null() || self.is_empty()
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        WideInt(i128::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    /// Render with `scale` fractional digits. Sentinels render as `NULL`/`EMPTY`.
    ///
    /// Fails for a scale beyond the 38 digits an `i128` can hold.
    pub fn to_string_scaled(self, scale: u8) -> Result<String> {
        if scale as usize >= POW10.len() {
            return Err(Error::InvalidArgumentError(format!(
                "decimal scale {scale} outside 0..={}",
                POW10.len() - 1
            )));
        }
        let mut out = String::with_capacity(48);
        self.write_scaled(scale, &mut out);
        Ok(out)
    }

    /// `scale` must index [`POW10`].
    pub(crate) fn write_scaled(self, scale: u8, out: &mut String) {
        if self.is_null() {
            out.push_str("NULL");
            return;
        }
        if self.is_empty() {
            out.push_str("EMPTY");
            return;
        }
        if self.0 < 0 {
            out.push('-');
        }
        let magnitude = self.0.unsigned_abs();
        if scale == 0 {
            write_limbs(magnitude, out);
            return;
        }
        let divisor = POW10[scale as usize] as u128;
        write_limbs(magnitude / divisor, out);
        out.push('.');
        let frac = magnitude % divisor;
        let start = out.len();
        write_limbs(frac, out);
        let written = out.len() - start;
        if written < scale as usize {
            let pad = "0".repeat(scale as usize - written);
            out.insert_str(start, &pad);
        }
    }
}

/// Append the decimal digits of `v`, splitting it into base-10^19 limbs.
///
/// The most significant limb is printed bare; the lower limbs are zero-padded to
/// nineteen digits.
fn write_limbs(v: u128, out: &mut String) {
    use std::fmt::Write;

    let low = (v % LIMB) as u64;
    let rest = v / LIMB;
    let mid = (rest % LIMB) as u64;
    let high = (rest / LIMB) as u64;
    // Writing into a String cannot fail.
    let _ = if high != 0 {
        write!(out, "{high}{mid:0w$}{low:0w$}", w = LIMB_DIGITS)
    } else if mid != 0 {
        write!(out, "{mid}{low:0w$}", w = LIMB_DIGITS)
    } else {
        write!(out, "{low}")
    };
}

impl fmt::Display for WideInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(48);
        self.write_scaled(0, &mut out);
        f.write_str(&out)
    }
}

impl From<i128> for WideInt {
    fn from(v: i128) -> Self {
        WideInt(v)
    }
}

impl From<i64> for WideInt {
    fn from(v: i64) -> Self {
        WideInt(v as i128)
    }
}
