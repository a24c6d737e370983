//! Batch strategy: gather the candidate values, run each predicate as one pass
//! over all of them, then emit.
//!
//! Only used when no predicate carries a flag byte; the outcome is identical to
//! the row strategy.

use colblk_result::Result;

use super::minmax::MinMax;
use super::output::OutputWriter;
use super::{BlockView, Sentinels};
use crate::filter::compare::ValueComparator;
use crate::filter::lane::Lane;
use crate::filter::{CompiledFilter, FilterMode};
use crate::ops::{BoolOp, CompareOp};

trait Combine {
    fn combine(acc: &mut bool, hit: bool);
}

struct And;
struct Or;
struct Xor;

impl Combine for And {
    #[inline(always)]
    fn combine(acc: &mut bool, hit: bool) {
        *acc &= hit;
    }
}

impl Combine for Or {
    #[inline(always)]
    fn combine(acc: &mut bool, hit: bool) {
        *acc |= hit;
    }
}

impl Combine for Xor {
    #[inline(always)]
    fn combine(acc: &mut bool, hit: bool) {
        *acc ^= hit;
    }
}

pub(super) fn scan<L: Lane, C: ValueComparator<L>, const W: usize>(
    cmp: &C,
    filter: &CompiledFilter<L>,
    view: &BlockView<'_>,
    sentinels: &Sentinels<L>,
    null_matches: bool,
    out: &mut OutputWriter,
) -> Result<MinMax<L>> {
    let mut rids = Vec::with_capacity(view.rid_count());
    let mut data = Vec::with_capacity(view.rid_count());
    view.try_for_each_rid(|rid| {
        let v = L::read::<W>(view.raw::<W>(rid), C::SIGNED_WIDEN);
        if !(view.skip_empty && v == sentinels.empty) {
            rids.push(rid);
            data.push(v);
        }
        Ok(())
    })?;

    let mut mm = MinMax::new();
    if view.track_min_max {
        for &v in data
            .iter()
            .filter(|&&v| v != sentinels.empty && !sentinels.is_null(v))
        {
            mm.update(cmp, v);
        }
    }

    let hits = evaluate(cmp, filter, &data);
    for ((&rid, &v), hit) in rids.iter().zip(&data).zip(hits) {
        let pass = if sentinels.is_null(v) { null_matches } else { hit };
        if pass {
            out.write(rid, view.raw::<W>(rid))?;
        }
    }
    Ok(mm)
}

/// Per-row outcome of the filter, treating every value as ordinary.
fn evaluate<L: Lane, C: ValueComparator<L>>(
    cmp: &C,
    filter: &CompiledFilter<L>,
    data: &[L],
) -> Vec<bool> {
    match filter.mode() {
        FilterMode::AlwaysTrue => vec![true; data.len()],
        FilterMode::OneOfValuesInSet => data.iter().map(|&v| filter.in_set(cmp, v, false)).collect(),
        FilterMode::NoneOfValuesInSet => {
            data.iter().map(|&v| !filter.in_set(cmp, v, false)).collect()
        }
        _ => match filter.bop() {
            BoolOp::And => passes::<And, L, C>(cmp, filter, data, true),
            BoolOp::Xor => passes::<Xor, L, C>(cmp, filter, data, false),
            BoolOp::Or | BoolOp::None => passes::<Or, L, C>(cmp, filter, data, false),
        },
    }
}

fn passes<B: Combine, L: Lane, C: ValueComparator<L>>(
    cmp: &C,
    filter: &CompiledFilter<L>,
    data: &[L],
    init: bool,
) -> Vec<bool> {
    let mut acc = vec![init; data.len()];
    for i in 0..filter.len() {
        let op = filter.ops()[i];
        let pv = filter.values()[i];
        if op == CompareOp::Nil
            || (C::NULL_AWARE && filter.value_is_null()[i] && op != CompareOp::Ne)
        {
            acc.iter_mut().for_each(|a| B::combine(a, false));
            continue;
        }
        // One arm per operator keeps the comparison constant inside each pass.
        match op {
            CompareOp::Lt => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Lt, 0, v, pv)),
            CompareOp::Le => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Le, 0, v, pv)),
            CompareOp::Eq => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Eq, 0, v, pv)),
            CompareOp::Ne => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Ne, 0, v, pv)),
            CompareOp::Ge => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Ge, 0, v, pv)),
            CompareOp::Gt => pass::<B, L>(&mut acc, data, |v| cmp.compare(CompareOp::Gt, 0, v, pv)),
            other => pass::<B, L>(&mut acc, data, |v| cmp.compare(other, 0, v, pv)),
        }
    }
    acc
}

#[inline(always)]
fn pass<B: Combine, L: Lane>(acc: &mut [bool], data: &[L], hit: impl Fn(L) -> bool) {
    for (a, &v) in acc.iter_mut().zip(data) {
        B::combine(a, hit(v));
    }
}
