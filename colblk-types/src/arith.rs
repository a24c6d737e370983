//! Overflow-checked integer arithmetic for decimal storage.
//!
//! Each operation is specialised statically over the storage integer
//! ([`DecimalInt`]: `i64` for precision up to 18, `i128` above) and an
//! [`OverflowPolicy`]. Under [`Checked`], a result outside
//! `[MIN_VALUE, MAX]` is an [`Error::Overflow`]; the two lowest values of each
//! storage type are the NULL/EMPTY sentinels and are never produced.

use std::fmt;

use arrow_buffer::i256;
use colblk_result::{Error, Result};

/// Storage integer behind a decimal value.
pub trait DecimalInt: Copy + Ord + Eq + fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
    const ZERO: Self;
    const MAX: Self;
    /// Smallest non-sentinel value.
    const MIN_VALUE: Self;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn checked_div(self, rhs: Self) -> Option<Self>;
    fn wrapping_div(self, rhs: Self) -> Self;
    /// Multiply through a double-width intermediate; `None` if the product does
    /// not fit back into `Self`.
    fn widening_mul_narrowed(self, rhs: Self) -> Option<Self>;
    fn to_i128(self) -> i128;
    fn from_i128(v: i128) -> Option<Self>;
}

impl DecimalInt for i64 {
    const NAME: &'static str = "i64";
    const ZERO: Self = 0;
    const MAX: Self = i64::MAX;
    const MIN_VALUE: Self = i64::MIN + 2;

    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        i64::wrapping_add(self, rhs)
    }
    #[inline]
    fn wrapping_sub(self, rhs: Self) -> Self {
        i64::wrapping_sub(self, rhs)
    }
    #[inline]
    fn wrapping_mul(self, rhs: Self) -> Self {
        i64::wrapping_mul(self, rhs)
    }
    #[inline]
    fn checked_div(self, rhs: Self) -> Option<Self> {
        i64::checked_div(self, rhs)
    }
    #[inline]
    fn wrapping_div(self, rhs: Self) -> Self {
        i64::wrapping_div(self, rhs)
    }
    #[inline]
    fn widening_mul_narrowed(self, rhs: Self) -> Option<Self> {
        let wide = self as i128 * rhs as i128;
        i64::try_from(wide).ok()
    }
    #[inline]
    fn to_i128(self) -> i128 {
        self as i128
    }
    #[inline]
    fn from_i128(v: i128) -> Option<Self> {
        i64::try_from(v).ok()
    }
}

impl DecimalInt for i128 {
    const NAME: &'static str = "i128";
    const ZERO: Self = 0;
    const MAX: Self = i128::MAX;
    const MIN_VALUE: Self = i128::MIN + 2;

    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        i128::wrapping_add(self, rhs)
    }
    #[inline]
    fn wrapping_sub(self, rhs: Self) -> Self {
        i128::wrapping_sub(self, rhs)
    }
    #[inline]
    fn wrapping_mul(self, rhs: Self) -> Self {
        i128::wrapping_mul(self, rhs)
    }
    #[inline]
    fn checked_div(self, rhs: Self) -> Option<Self> {
        i128::checked_div(self, rhs)
    }
    #[inline]
    fn wrapping_div(self, rhs: Self) -> Self {
        i128::wrapping_div(self, rhs)
    }
    #[inline]
    fn widening_mul_narrowed(self, rhs: Self) -> Option<Self> {
        let wide = i256::from_i128(self).wrapping_mul(i256::from_i128(rhs));
        wide.to_i128()
    }
    #[inline]
    fn to_i128(self) -> i128 {
        self
    }
    #[inline]
    fn from_i128(v: i128) -> Option<Self> {
        Some(v)
    }
}

/// Whether arithmetic detects overflow.
pub trait OverflowPolicy {
    const CHECKED: bool;
}

/// Overflow is reported as [`Error::Overflow`].
#[derive(Debug, Clone, Copy)]
pub struct Checked;

/// Two's-complement wrapping; for callers that already proved the range.
#[derive(Debug, Clone, Copy)]
pub struct Wrapping;

impl OverflowPolicy for Checked {
    const CHECKED: bool = true;
}

impl OverflowPolicy for Wrapping {
    const CHECKED: bool = false;
}

#[inline]
fn overflow<T: DecimalInt>(op: &'static str) -> Error {
    Error::overflow(op, T::NAME, T::NAME)
}

pub fn add<T: DecimalInt, P: OverflowPolicy>(x: T, y: T) -> Result<T> {
    if P::CHECKED
        && ((y > T::ZERO && x > T::MAX.wrapping_sub(y))
            || (y < T::ZERO && x < T::MIN_VALUE.wrapping_sub(y)))
    {
        return Err(overflow::<T>("add"));
    }
    Ok(x.wrapping_add(y))
}

pub fn subtract<T: DecimalInt, P: OverflowPolicy>(x: T, y: T) -> Result<T> {
    if P::CHECKED
        && ((y < T::ZERO && x > T::MAX.wrapping_add(y))
            || (y > T::ZERO && x < T::MIN_VALUE.wrapping_add(y)))
    {
        return Err(overflow::<T>("subtract"));
    }
    Ok(x.wrapping_sub(y))
}

pub fn multiply<T: DecimalInt, P: OverflowPolicy>(x: T, y: T) -> Result<T> {
    if !P::CHECKED {
        return Ok(x.wrapping_mul(y));
    }
    match x.widening_mul_narrowed(y) {
        Some(product) if product >= T::MIN_VALUE => Ok(product),
        _ => Err(overflow::<T>("multiply")),
    }
}

/// Integer division truncating toward zero.
pub fn divide<T: DecimalInt, P: OverflowPolicy>(x: T, y: T) -> Result<T> {
    if y == T::ZERO {
        return Err(Error::InvalidArgumentError("decimal division by zero".into()));
    }
    if !P::CHECKED {
        return Ok(x.wrapping_div(y));
    }
    // Only MIN / -1 leaves the range.
    x.checked_div(y).ok_or_else(|| overflow::<T>("divide"))
}
