//! Scaled decimal values over narrow (`i64`) or wide (`i128`) storage.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use colblk_result::{Error, Result};

use crate::arith::{self, Checked, DecimalInt};
use crate::wide::{POW10, WideInt};

pub const MAX_DECIMAL_PRECISION: u8 = 38;
/// Largest precision stored in 64 bits.
pub const MAX_NARROW_PRECISION: u8 = 18;

/// Storage integer chosen from a column's declared precision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecimalStorage {
    /// `i64`, precision `1..=18`.
    Narrow,
    /// `i128`, precision `19..=38`.
    Wide,
}

impl DecimalStorage {
    #[inline]
    pub fn for_precision(precision: u8) -> Self {
        if precision <= MAX_NARROW_PRECISION {
            DecimalStorage::Narrow
        } else {
            DecimalStorage::Wide
        }
    }

    /// Byte width of a column value with this storage.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            DecimalStorage::Narrow => 8,
            DecimalStorage::Wide => 16,
        }
    }
}

/// A decimal number `value / 10^scale` with a declared precision.
///
/// Equality and ordering are numeric: `1.50` (150, scale 2) equals `1.5`
/// (15, scale 1).
#[derive(Copy, Clone, Debug)]
pub struct Decimal {
    value: i128,
    scale: u8,
    precision: u8,
}

impl Decimal {
    /// Create a decimal from its raw parts.
    pub fn new(value: i128, scale: u8, precision: u8) -> Result<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(Error::InvalidArgumentError(format!(
                "decimal precision {precision} outside 1..={MAX_DECIMAL_PRECISION}"
            )));
        }
        if scale > MAX_DECIMAL_PRECISION {
            return Err(Error::InvalidArgumentError(format!(
                "decimal scale {scale} outside 0..={MAX_DECIMAL_PRECISION}"
            )));
        }
        if DecimalStorage::for_precision(precision) == DecimalStorage::Narrow
            && i64::try_from(value).is_err()
        {
            return Err(Error::InvalidArgumentError(format!(
                "value {value} does not fit precision {precision}"
            )));
        }
        Ok(Self {
            value,
            scale,
            precision,
        })
    }

    pub fn from_wide(value: WideInt, scale: u8, precision: u8) -> Result<Self> {
        Self::new(value.0, scale, precision)
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            value: value as i128,
            scale: 0,
            precision: MAX_NARROW_PRECISION + 1,
        }
    }

    /// The NULL marker for a column of the given shape.
    pub fn null(scale: u8, precision: u8) -> Self {
        let value = match DecimalStorage::for_precision(precision) {
            DecimalStorage::Narrow => i64::MIN as i128,
            DecimalStorage::Wide => WideInt::NULL.0,
        };
        Self {
            value,
            scale,
            precision,
        }
    }

    #[inline]
    pub fn value(&self) -> i128 {
        self.value
    }

    #[inline]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    #[inline]
    pub fn storage(&self) -> DecimalStorage {
        DecimalStorage::for_precision(self.precision)
    }

    pub fn is_null(&self) -> bool {
        match self.storage() {
            DecimalStorage::Narrow => self.value == i64::MIN as i128,
            DecimalStorage::Wide => WideInt(self.value).is_null(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.storage() {
            DecimalStorage::Narrow => self.value == i64::MIN as i128 + 1,
            DecimalStorage::Wide => WideInt(self.value).is_empty(),
        }
    }

    /// Three-way numeric comparison, tolerant of differing scales.
    ///
    /// Equal scales compare the raw integers. Otherwise each side is split into
    /// `value / 10^scale` and `value % 10^scale`; quotients are compared first and
    /// a tie is broken by the remainders aligned to the larger scale. No step
    /// rescales a full value, so nothing can overflow.
    pub fn compare(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.value.cmp(&other.value);
        }
        let (lq, lr) = split(self.value, self.scale);
        let (rq, rr) = split(other.value, other.scale);
        match lq.cmp(&rq) {
            Ordering::Equal => {}
            ord => return ord,
        }
        if self.scale < other.scale {
            let lr = lr * POW10[(other.scale - self.scale) as usize];
            lr.cmp(&rr)
        } else {
            let rr = rr * POW10[(self.scale - other.scale) as usize];
            lr.cmp(&rr)
        }
    }

    /// Integer part, truncated toward zero.
    #[inline]
    pub fn integral_part(&self) -> i128 {
        split(self.value, self.scale).0
    }

    /// Fractional digits as an integer with the sign of the value.
    #[inline]
    pub fn fractional_part(&self) -> i128 {
        split(self.value, self.scale).1
    }

    /// Integer part rounded half away from zero.
    pub fn rounded_integral_part(&self) -> i128 {
        if self.scale == 0 {
            return self.value;
        }
        let (q, r) = split(self.value, self.scale);
        let half = POW10[self.scale as usize] / 2;
        if r >= half {
            q + 1
        } else if r <= -half {
            q - 1
        } else {
            q
        }
    }

    /// Lossy conversion for display and estimation.
    pub fn to_f64(&self) -> f64 {
        self.value as f64 / 10f64.powi(self.scale as i32)
    }

    /// Change the scale. Growing multiplies with overflow checking; shrinking
    /// truncates toward zero.
    pub fn rescale(&self, scale: u8) -> Result<Self> {
        if scale > MAX_DECIMAL_PRECISION {
            return Err(Error::InvalidArgumentError(format!(
                "decimal scale {scale} outside 0..={MAX_DECIMAL_PRECISION}"
            )));
        }
        let value = match scale.cmp(&self.scale) {
            Ordering::Equal => self.value,
            Ordering::Greater => in_storage(
                self.storage(),
                "multiply",
                self.value,
                POW10[(scale - self.scale) as usize],
                arith::multiply::<i64, Checked>,
                arith::multiply::<i128, Checked>,
            )?,
            Ordering::Less => self.value / POW10[(self.scale - scale) as usize],
        };
        Ok(Self { value, scale, ..*self })
    }

    pub fn checked_add(&self, rhs: &Self) -> Result<Self> {
        let (a, b, scale, storage, precision) = self.aligned(rhs)?;
        let value = in_storage(
            storage,
            "add",
            a,
            b,
            arith::add::<i64, Checked>,
            arith::add::<i128, Checked>,
        )?;
        Ok(Self {
            value,
            scale,
            precision,
        })
    }

    pub fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        let (a, b, scale, storage, precision) = self.aligned(rhs)?;
        let value = in_storage(
            storage,
            "subtract",
            a,
            b,
            arith::subtract::<i64, Checked>,
            arith::subtract::<i128, Checked>,
        )?;
        Ok(Self {
            value,
            scale,
            precision,
        })
    }

    /// Product with scale `lhs.scale + rhs.scale`.
    pub fn checked_mul(&self, rhs: &Self) -> Result<Self> {
        let scale = self.scale + rhs.scale;
        if scale > MAX_DECIMAL_PRECISION {
            return Err(Error::overflow("multiply", "scale", "scale"));
        }
        let precision = self.precision.max(rhs.precision);
        let value = in_storage(
            DecimalStorage::for_precision(precision),
            "multiply",
            self.value,
            rhs.value,
            arith::multiply::<i64, Checked>,
            arith::multiply::<i128, Checked>,
        )?;
        Ok(Self {
            value,
            scale,
            precision,
        })
    }

    /// Quotient keeping the dividend's scale, truncated toward zero.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self> {
        let precision = self.precision.max(rhs.precision);
        let storage = DecimalStorage::for_precision(precision);
        let numerator = in_storage(
            storage,
            "divide",
            self.value,
            POW10[rhs.scale as usize],
            arith::multiply::<i64, Checked>,
            arith::multiply::<i128, Checked>,
        )?;
        let value = in_storage(
            storage,
            "divide",
            numerator,
            rhs.value,
            arith::divide::<i64, Checked>,
            arith::divide::<i128, Checked>,
        )?;
        Ok(Self {
            value,
            scale: self.scale,
            precision,
        })
    }

    /// Bring both operands to the larger scale in the wider of their storages.
    fn aligned(&self, rhs: &Self) -> Result<(i128, i128, u8, DecimalStorage, u8)> {
        let precision = self.precision.max(rhs.precision);
        let scale = self.scale.max(rhs.scale);
        let a = Self { precision, ..*self }.rescale(scale)?.value;
        let b = Self { precision, ..*rhs }.rescale(scale)?.value;
        Ok((a, b, scale, DecimalStorage::for_precision(precision), precision))
    }
}

#[inline]
fn split(value: i128, scale: u8) -> (i128, i128) {
    if scale == 0 {
        return (value, 0);
    }
    let divisor = POW10[scale as usize];
    (value / divisor, value % divisor)
}

/// Run `narrow` or `wide` on the operands according to `storage`.
fn in_storage(
    storage: DecimalStorage,
    op: &'static str,
    a: i128,
    b: i128,
    narrow: fn(i64, i64) -> Result<i64>,
    wide: fn(i128, i128) -> Result<i128>,
) -> Result<i128> {
    match storage {
        DecimalStorage::Narrow => {
            let (Some(x), Some(y)) = (i64::from_i128(a), i64::from_i128(b)) else {
                return Err(Error::overflow(op, "i64", "i64"));
            };
            narrow(x, y).map(i128::from)
        }
        DecimalStorage::Wide => wide(a, b),
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        if self.is_empty() {
            return f.write_str("EMPTY");
        }
        let mut out = String::with_capacity(48);
        WideInt(self.value).write_scaled(self.scale, &mut out);
        f.write_str(&out)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    /// Parse `[+-]digits[.digits]`. The scale is the number of fractional digits.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgumentError(format!("invalid decimal literal '{s}'"));
        let text = s.trim();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let scale = frac_part.len();
        if scale > MAX_DECIMAL_PRECISION as usize {
            return Err(invalid());
        }
        let mut value: i128 = 0;
        let mut significant = 0usize;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
            if value != 0 || b != b'0' {
                significant += 1;
            }
            if significant > MAX_DECIMAL_PRECISION as usize {
                return Err(invalid());
            }
            value = value * 10 + (b - b'0') as i128;
        }
        if negative {
            value = -value;
        }
        let precision = significant.max(scale).max(1) as u8;
        Self::new(value, scale as u8, precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn formats_scaled_wide_values() {
        let a = Decimal::new(1050, 2, 20).unwrap();
        let b = Decimal::new(-1050, 2, 20).unwrap();
        assert_eq!(a.to_string(), "10.50");
        assert_eq!(b.to_string(), "-10.50");
        assert_eq!(Decimal::null(2, 20).to_string(), "NULL");
    }

    #[test]
    fn compare_across_scales() {
        assert_eq!(dec("1.5").compare(&dec("1.50")), Ordering::Equal);
        assert_eq!(dec("-0.5").compare(&dec("0.3")), Ordering::Less);
        assert_eq!(dec("-1.5").compare(&dec("-1.25")), Ordering::Less);
        assert_eq!(dec("2").compare(&dec("1.999")), Ordering::Greater);
        assert_eq!(dec("-0.001").compare(&dec("-1")), Ordering::Greater);
    }

    #[test]
    fn arithmetic_aligns_scales() {
        assert_eq!(dec("1.25").checked_add(&dec("2.5")).unwrap().to_string(), "3.75");
        assert_eq!(dec("1.25").checked_sub(&dec("2.5")).unwrap().to_string(), "-1.25");
        assert_eq!(dec("1.5").checked_mul(&dec("-2.0")).unwrap().to_string(), "-3.00");
        assert_eq!(dec("7.00").checked_div(&dec("2")).unwrap().to_string(), "3.50");
    }

    #[test]
    fn narrow_overflow_is_reported() {
        let big = Decimal::new(i64::MAX as i128, 0, 18).unwrap();
        let err = big.checked_add(&Decimal::new(1, 0, 18).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Overflow { op: "add", lhs: "i64", .. }));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("12a".parse::<Decimal>().is_err());
        assert!("1".repeat(39).parse::<Decimal>().is_err());
        assert_eq!(dec("-.5").to_string(), "-0.5");
        assert_eq!(dec("0.005").precision(), 3);
    }

    #[test]
    fn rounding_and_parts() {
        let d = dec("-12.50");
        assert_eq!(d.integral_part(), -12);
        assert_eq!(d.fractional_part(), -50);
        assert_eq!(d.rounded_integral_part(), -13);
        assert_eq!(dec("12.49").rounded_integral_part(), 12);
        assert_eq!(dec("1.239").rescale(2).unwrap().value(), 123);
    }
}
