use std::cmp::Ordering;

use crate::filter::compare::ValueComparator;
use crate::filter::lane::Lane;

/// Running minimum and maximum of the non-NULL, non-EMPTY values of a block.
///
/// The two bounds update independently.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MinMax<L: Lane> {
    min: Option<L>,
    max: Option<L>,
}

impl<L: Lane> MinMax<L> {
    pub(crate) fn new() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    #[inline(always)]
    pub(crate) fn update<C: ValueComparator<L>>(&mut self, cmp: &C, v: L) {
        if self.min.is_none_or(|m| cmp.order(v, m) == Ordering::Less) {
            self.min = Some(v);
        }
        if self.max.is_none_or(|m| cmp.order(v, m) == Ordering::Greater) {
            self.max = Some(v);
        }
    }

    /// Header representation; an untouched tracker reports the inverted range.
    pub(crate) fn finish<C: ValueComparator<L>>(&self, cmp: &C) -> (i128, i128) {
        let (empty_min, empty_max) = cmp.empty_range();
        (
            self.min.map_or(empty_min, |v| cmp.min_max_repr(v)),
            self.max.map_or(empty_max, |v| cmp.min_max_repr(v)),
        )
    }
}
