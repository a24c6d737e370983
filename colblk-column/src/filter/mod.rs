//! Column filter compiler.
//!
//! A filter arrives as a flat list of predicate records
//! `{ op: u8, flag: u8, value: [u8; width] }` plus a combinator. Compilation
//! decodes the records into parallel arrays and picks the evaluation
//! [`FilterMode`] once, so every block of the step reuses it:
//!
//! | predicates | combinator | operators | mode |
//! |---|---|---|---|
//! | 0 | any | - | `AlwaysTrue` |
//! | 1 | any | any | `SingleComparison` |
//! | >1 | OR | all `=` | `OneOfValuesInArray` (<= 8) / `OneOfValuesInSet` |
//! | >1 | AND | all `!=` | `NoneOfValuesInArray` (<= 8) / `NoneOfValuesInSet` |
//! | >1 | OR / AND / XOR | mixed | `AnyComparisonTrue` / `AllComparisonsTrue` / `XorComparisons` |
//!
//! Predicates with a non-zero flag byte never join the value lists; their
//! `=`/`!=` results do not depend on the value.

pub mod compare;
pub mod lane;

use rustc_hash::FxHashSet;

use colblk_result::{Error, Result};
use colblk_types::{ColumnKind, LogicalType, sentinels};

use crate::constants::{MAX_ARRAY_FILTER_VALUES, PREDICATE_HEADER_SIZE};
use crate::ops::{BoolOp, CompareOp};
use compare::ValueComparator;
use lane::Lane;

/// Evaluation strategy selected at compile time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FilterMode {
    AlwaysTrue,
    SingleComparison,
    AnyComparisonTrue,
    AllComparisonsTrue,
    XorComparisons,
    OneOfValuesInArray,
    NoneOfValuesInArray,
    OneOfValuesInSet,
    NoneOfValuesInSet,
}

/// Decoded predicates over lane type `L`.
#[derive(Debug, Clone)]
pub struct CompiledFilter<L: Lane> {
    mode: FilterMode,
    bop: BoolOp,
    ops: Vec<CompareOp>,
    flags: Vec<u8>,
    values: Vec<L>,
    /// Predicate value is the column's NULL pattern.
    value_is_null: Vec<bool>,
    /// Values of zero-flag predicates, for the value-list modes.
    members: Vec<L>,
    set: Option<FxHashSet<L>>,
}

impl<L: Lane> CompiledFilter<L> {
    fn always_true() -> Self {
        Self {
            mode: FilterMode::AlwaysTrue,
            bop: BoolOp::None,
            ops: Vec::new(),
            flags: Vec::new(),
            values: Vec::new(),
            value_is_null: Vec::new(),
            members: Vec::new(),
            set: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    #[inline]
    pub fn bop(&self) -> BoolOp {
        self.bop
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[CompareOp] {
        &self.ops
    }

    pub fn values(&self) -> &[L] {
        &self.values
    }

    pub(crate) fn value_is_null(&self) -> &[bool] {
        &self.value_is_null
    }

    #[cfg(test)]
    fn set(&self) -> Option<&FxHashSet<L>> {
        self.set.as_ref()
    }

    #[cfg(test)]
    fn members(&self) -> &[L] {
        &self.members
    }

    /// True when no predicate carries a flag byte.
    pub fn flags_all_zero(&self) -> bool {
        self.flags.iter().all(|&f| f == 0)
    }

    /// Evaluate predicate `i` against `v`. `is_null` marks `v` as the column's
    /// NULL pattern.
    ///
    /// NULL values, and every value of an integer kind, compare as raw
    /// integers, and only when both sides agree on NULL-ness; a NULL-valued
    /// predicate still compares for `!=`, so `x != NULL` matches non-NULL data.
    #[inline(always)]
    pub fn eval_predicate<C: ValueComparator<L>>(
        &self,
        cmp: &C,
        i: usize,
        v: L,
        is_null: bool,
    ) -> bool {
        let op = self.ops[i];
        if op == CompareOp::Nil {
            return false;
        }
        let (rf, pv) = (self.flags[i], self.values[i]);
        if is_null || C::NULL_AWARE {
            let pv_null = self.value_is_null[i];
            if is_null == pv_null || (pv_null && op == CompareOp::Ne) {
                if C::NULL_AWARE {
                    cmp.compare(op, rf, v, pv)
                } else {
                    compare::compare_with_flags(op, rf, v, pv)
                }
            } else {
                false
            }
        } else {
            cmp.compare(op, rf, v, pv)
        }
    }

    /// Whether `v` passes the whole filter.
    pub fn matches<C: ValueComparator<L>>(&self, cmp: &C, v: L, is_null: bool) -> bool {
        let n = self.ops.len();
        match self.mode {
            FilterMode::AlwaysTrue => true,
            FilterMode::SingleComparison => self.eval_predicate(cmp, 0, v, is_null),
            FilterMode::AnyComparisonTrue => {
                (0..n).any(|i| self.eval_predicate(cmp, i, v, is_null))
            }
            FilterMode::AllComparisonsTrue => {
                (0..n).all(|i| self.eval_predicate(cmp, i, v, is_null))
            }
            FilterMode::XorComparisons => (0..n)
                .fold(false, |acc, i| acc ^ self.eval_predicate(cmp, i, v, is_null)),
            FilterMode::OneOfValuesInArray => self.in_array(cmp, v, is_null),
            // NULL never passes an inequality list.
            FilterMode::NoneOfValuesInArray => !is_null && !self.in_array(cmp, v, false),
            FilterMode::OneOfValuesInSet => self.in_set(cmp, v, is_null),
            FilterMode::NoneOfValuesInSet => !is_null && !self.in_set(cmp, v, false),
        }
    }

    #[inline]
    fn in_array<C: ValueComparator<L>>(&self, cmp: &C, v: L, is_null: bool) -> bool {
        if is_null {
            self.members.contains(&v)
        } else {
            self.members.iter().any(|&m| cmp.equal(v, m))
        }
    }

    #[inline]
    pub(crate) fn in_set<C: ValueComparator<L>>(&self, cmp: &C, v: L, is_null: bool) -> bool {
        let Some(set) = self.set.as_ref() else {
            return false;
        };
        if is_null {
            set.contains(&v)
        } else {
            cmp.set_contains(set, &self.members, v)
        }
    }
}

/// Width-erased compiled filter, shared read-only by every block scan of a step.
#[derive(Debug, Clone)]
pub enum ParsedColumnFilter {
    Narrow(CompiledFilter<i64>),
    Wide(CompiledFilter<i128>),
}

impl ParsedColumnFilter {
    pub fn mode(&self) -> FilterMode {
        match self {
            ParsedColumnFilter::Narrow(f) => f.mode(),
            ParsedColumnFilter::Wide(f) => f.mode(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParsedColumnFilter::Narrow(f) => f.len(),
            ParsedColumnFilter::Wide(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter matching every value, for a column of `width` bytes.
    pub fn always_true(width: usize) -> Self {
        if width == 16 {
            ParsedColumnFilter::Wide(CompiledFilter::always_true())
        } else {
            ParsedColumnFilter::Narrow(CompiledFilter::always_true())
        }
    }
}

/// Compile `count` predicate records from `filter` for a column of the given
/// width and type.
pub fn compile(
    filter: &[u8],
    width: usize,
    logical_type: LogicalType,
    count: u16,
    bop: BoolOp,
) -> Result<ParsedColumnFilter> {
    let pair = sentinels(width, logical_type)?;
    let signed = !matches!(logical_type.kind(), ColumnKind::Unsigned);
    if width == 16 {
        compile_typed::<i128>(filter, width, signed, pair, count, bop).map(ParsedColumnFilter::Wide)
    } else {
        compile_typed::<i64>(filter, width, signed, pair, count, bop)
            .map(ParsedColumnFilter::Narrow)
    }
}

fn compile_typed<L: Lane>(
    filter: &[u8],
    width: usize,
    signed: bool,
    pair: colblk_types::SentinelPair,
    count: u16,
    bop: BoolOp,
) -> Result<CompiledFilter<L>> {
    if count == 0 {
        return Ok(CompiledFilter::always_true());
    }
    let count = count as usize;
    if count > 1 && bop == BoolOp::None {
        return Err(Error::InvalidArgumentError(format!(
            "{count} predicates require a combinator"
        )));
    }
    let record = PREDICATE_HEADER_SIZE + width;
    if filter.len() < count * record {
        return Err(Error::decode(format!(
            "filter holds {} bytes, {count} predicates of width {width} need {}",
            filter.len(),
            count * record
        )));
    }

    let null = L::from_pattern(pair.null, width, signed);
    let alt_null = pair.alt_null.map(|bits| L::from_pattern(bits, width, signed));

    let mut ops = Vec::with_capacity(count);
    let mut flags = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);
    let mut value_is_null = Vec::with_capacity(count);
    for rec in filter.chunks_exact(record).take(count) {
        let op = CompareOp::from_wire(rec[0])?;
        let value = read_value::<L>(&rec[PREDICATE_HEADER_SIZE..], signed);
        ops.push(op);
        flags.push(rec[1]);
        values.push(value);
        value_is_null.push(value == null || alt_null == Some(value));
    }

    let mut mode = match (count, bop) {
        (1, _) => FilterMode::SingleComparison,
        (_, BoolOp::Or) => FilterMode::AnyComparisonTrue,
        (_, BoolOp::And) => FilterMode::AllComparisonsTrue,
        _ => FilterMode::XorComparisons,
    };

    let mut members = Vec::new();
    let mut set = None;
    if count > 1 {
        let canonical = match bop {
            BoolOp::Or => Some(CompareOp::Eq),
            BoolOp::And => Some(CompareOp::Ne),
            _ => None,
        };
        if let Some(canonical) = canonical
            && ops.iter().all(|&op| op == canonical)
        {
            members = values
                .iter()
                .zip(&flags)
                .filter(|&(_, &rf)| rf == 0)
                .map(|(&v, _)| v)
                .collect();
            let one_of = bop == BoolOp::Or;
            mode = if count <= MAX_ARRAY_FILTER_VALUES {
                if one_of {
                    FilterMode::OneOfValuesInArray
                } else {
                    FilterMode::NoneOfValuesInArray
                }
            } else {
                set = Some(members.iter().copied().collect::<FxHashSet<L>>());
                if one_of {
                    FilterMode::OneOfValuesInSet
                } else {
                    FilterMode::NoneOfValuesInSet
                }
            };
        }
    }

    tracing::debug!("[FILTER] compiled {} predicate(s) as {:?}", count, mode);

    Ok(CompiledFilter {
        mode,
        bop,
        ops,
        flags,
        values,
        value_is_null,
        members,
        set,
    })
}

fn read_value<L: Lane>(bytes: &[u8], signed: bool) -> L {
    match bytes.len() {
        1 => L::read::<1>(bytes, signed),
        2 => L::read::<2>(bytes, signed),
        4 => L::read::<4>(bytes, signed),
        8 => L::read::<8>(bytes, signed),
        _ => L::read::<16>(bytes, signed),
    }
}
