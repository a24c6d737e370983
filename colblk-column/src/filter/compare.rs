//! Per-kind comparison semantics, one zero-sized or tiny comparator per
//! (kind, width) so the scan loop is monomorphized over it.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::filter::lane::Lane;
use crate::ops::CompareOp;
use crate::text::Collation;

/// Comparison semantics for one column kind over lane type `L`.
pub trait ValueComparator<L: Lane>: Send + Sync {
    /// Sign-extend narrow values when widening them.
    const SIGNED_WIDEN: bool;
    /// Integer kinds compare against a NULL-valued predicate only for `!=`.
    const NULL_AWARE: bool;
    /// Eligible for the batch strategy.
    const VERTICAL: bool;

    /// Compare an ordinary (non-NULL) value `a` with predicate value `b`.
    fn compare(&self, op: CompareOp, rf: u8, a: L, b: L) -> bool;

    /// Equality used by the value-list filter modes.
    #[inline(always)]
    fn equal(&self, a: L, b: L) -> bool {
        self.compare(CompareOp::Eq, 0, a, b)
    }

    /// Membership of an ordinary value in a prestored set built from `members`.
    #[inline(always)]
    fn set_contains(&self, set: &FxHashSet<L>, _members: &[L], v: L) -> bool {
        set.contains(&v)
    }

    /// Ordering used for min/max tracking.
    fn order(&self, a: L, b: L) -> Ordering;

    /// Representation of a tracked value in the response header.
    fn min_max_repr(&self, v: L) -> i128 {
        v.to_i128()
    }

    /// Header values for a block with nothing tracked: `min > max`.
    fn empty_range(&self) -> (i128, i128);
}

/// Integer comparison honouring the predicate flag byte.
///
/// A non-zero flag turns a strict comparison inclusive (or the reverse) for
/// values equal to the predicate.
#[inline(always)]
pub fn compare_with_flags<T: Ord>(op: CompareOp, rf: u8, a: T, b: T) -> bool {
    match op {
        CompareOp::Nil | CompareOp::Like | CompareOp::NotLike => false,
        CompareOp::Lt => a < b || (a == b && (rf & 0x01) != 0),
        CompareOp::Le => a < b || (a == b && (rf ^ 0x80) != 0),
        CompareOp::Eq => a == b && rf == 0,
        CompareOp::Ne => a != b || rf != 0,
        CompareOp::Ge => a > b || (a == b && (rf ^ 0x01) != 0),
        CompareOp::Gt => a > b || (a == b && (rf & 0x80) != 0),
    }
}

/// Text comparison with a non-zero flag, over big-endian byte order.
#[inline]
fn compare_text_flagged(op: CompareOp, rf: u8, a: u64, b: u64) -> bool {
    match op {
        CompareOp::Nil | CompareOp::Like | CompareOp::NotLike => false,
        CompareOp::Lt => a < b || (a == b && rf != 0),
        CompareOp::Le => a <= b,
        CompareOp::Eq => a == b && rf == 0,
        CompareOp::Ne => a != b || rf != 0,
        CompareOp::Ge => a > b || (a == b && rf == 0),
        CompareOp::Gt => a > b,
    }
}

#[inline(always)]
fn compare_partial<T: PartialOrd>(op: CompareOp, a: T, b: T) -> bool {
    match op {
        CompareOp::Nil | CompareOp::Like | CompareOp::NotLike => false,
        CompareOp::Lt => a < b,
        CompareOp::Eq => a == b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ne => a != b,
        CompareOp::Ge => a >= b,
    }
}

fn ordering_matches(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Nil | CompareOp::Like | CompareOp::NotLike => false,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Ge => ord != Ordering::Less,
    }
}

/// Signed integers of any width, including 16-byte decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedCmp;

impl<L: Lane> ValueComparator<L> for SignedCmp {
    const SIGNED_WIDEN: bool = true;
    const NULL_AWARE: bool = true;
    const VERTICAL: bool = true;

    #[inline(always)]
    fn compare(&self, op: CompareOp, rf: u8, a: L, b: L) -> bool {
        compare_with_flags(op, rf, a, b)
    }

    #[inline(always)]
    fn order(&self, a: L, b: L) -> Ordering {
        a.cmp(&b)
    }

    fn empty_range(&self) -> (i128, i128) {
        if L::WIDTH == 16 {
            (i128::MAX, i128::MIN)
        } else {
            (i64::MAX as i128, i64::MIN as i128)
        }
    }
}

/// Unsigned integers and temporal types up to 8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedCmp;

impl ValueComparator<i64> for UnsignedCmp {
    const SIGNED_WIDEN: bool = false;
    const NULL_AWARE: bool = true;
    const VERTICAL: bool = true;

    #[inline(always)]
    fn compare(&self, op: CompareOp, rf: u8, a: i64, b: i64) -> bool {
        compare_with_flags(op, rf, a as u64, b as u64)
    }

    #[inline(always)]
    fn order(&self, a: i64, b: i64) -> Ordering {
        (a as u64).cmp(&(b as u64))
    }

    fn min_max_repr(&self, v: i64) -> i128 {
        v as u64 as i128
    }

    fn empty_range(&self) -> (i128, i128) {
        (u64::MAX as i128, 0)
    }
}

/// IEEE-754 values reinterpreted from 4- or 8-byte storage. The flag byte does
/// not apply to float comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCmp<const W: usize>;

impl<const W: usize> FloatCmp<W> {
    #[inline(always)]
    fn as_f64(v: i64) -> f64 {
        if W == 4 {
            f32::from_bits(v as u32) as f64
        } else {
            f64::from_bits(v as u64)
        }
    }

    #[inline(always)]
    fn zero_bits(negative: bool) -> i64 {
        match (W, negative) {
            (4, false) => 0.0f32.to_bits() as i32 as i64,
            (4, true) => (-0.0f32).to_bits() as i32 as i64,
            (_, false) => 0.0f64.to_bits() as i64,
            (_, true) => (-0.0f64).to_bits() as i64,
        }
    }
}

impl<const W: usize> ValueComparator<i64> for FloatCmp<W> {
    const SIGNED_WIDEN: bool = true;
    const NULL_AWARE: bool = false;
    const VERTICAL: bool = true;

    #[inline(always)]
    fn compare(&self, op: CompareOp, _rf: u8, a: i64, b: i64) -> bool {
        // f32 -> f64 widening is exact, so comparing in f64 preserves f32 order.
        compare_partial(op, Self::as_f64(a), Self::as_f64(b))
    }

    fn set_contains(&self, set: &FxHashSet<i64>, _members: &[i64], v: i64) -> bool {
        let f = Self::as_f64(v);
        if f.is_nan() {
            return false;
        }
        if f == 0.0 {
            return set.contains(&Self::zero_bits(false)) || set.contains(&Self::zero_bits(true));
        }
        set.contains(&v)
    }

    fn order(&self, a: i64, b: i64) -> Ordering {
        Self::as_f64(a).total_cmp(&Self::as_f64(b))
    }

    fn empty_range(&self) -> (i128, i128) {
        (i64::MAX as i128, i64::MIN as i128)
    }
}

/// Fixed-width text of `W` bytes (at most 8) under a collation.
#[derive(Debug, Clone, Copy)]
pub struct TextCmp<const W: usize> {
    pub collation: Collation,
}

impl<const W: usize> TextCmp<W> {
    #[inline(always)]
    fn bytes(v: i64) -> [u8; 8] {
        (v as u64).to_le_bytes()
    }

    /// Stored bytes read as a big-endian number.
    #[inline(always)]
    fn swapped(v: i64) -> u64 {
        let b = Self::bytes(v);
        let mut be = [0u8; 8];
        be[8 - W..].copy_from_slice(&b[..W]);
        u64::from_be_bytes(be)
    }
}

impl<const W: usize> ValueComparator<i64> for TextCmp<W> {
    const SIGNED_WIDEN: bool = true;
    const NULL_AWARE: bool = false;
    const VERTICAL: bool = false;

    fn compare(&self, op: CompareOp, rf: u8, a: i64, b: i64) -> bool {
        let (ab, bb) = (Self::bytes(a), Self::bytes(b));
        if op.is_like() {
            let matched = self.collation.like(&ab[..W], &bb[..W]);
            return matched != (op == CompareOp::NotLike);
        }
        if rf != 0 {
            return compare_text_flagged(op, rf, Self::swapped(a), Self::swapped(b));
        }
        ordering_matches(op, self.collation.compare(&ab[..W], &bb[..W]))
    }

    fn set_contains(&self, set: &FxHashSet<i64>, members: &[i64], v: i64) -> bool {
        if self.collation.is_binary() {
            set.contains(&v)
        } else {
            members.iter().any(|&m| self.equal(v, m))
        }
    }

    fn order(&self, a: i64, b: i64) -> Ordering {
        if W == 1 {
            return a.cmp(&b);
        }
        self.collation
            .compare(&Self::bytes(a)[..W], &Self::bytes(b)[..W])
    }

    fn empty_range(&self) -> (i128, i128) {
        (i64::MAX as i128, i64::MIN as i128)
    }
}
