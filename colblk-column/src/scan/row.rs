//! Row-at-a-time strategy. Handles every filter, including predicates with a
//! flag byte.

use colblk_result::Result;

use super::minmax::MinMax;
use super::output::OutputWriter;
use super::{BlockView, Sentinels};
use crate::filter::CompiledFilter;
use crate::filter::compare::ValueComparator;
use crate::filter::lane::Lane;

pub(super) fn scan<L: Lane, C: ValueComparator<L>, const W: usize>(
    cmp: &C,
    filter: &CompiledFilter<L>,
    view: &BlockView<'_>,
    sentinels: &Sentinels<L>,
    empty_matches: bool,
    null_matches: bool,
    out: &mut OutputWriter,
) -> Result<MinMax<L>> {
    let mut mm = MinMax::new();
    view.try_for_each_rid(|rid| {
        let raw = view.raw::<W>(rid);
        let v = L::read::<W>(raw, C::SIGNED_WIDEN);
        if v == sentinels.empty {
            if !view.skip_empty && empty_matches {
                out.write(rid, raw)?;
            }
        } else if sentinels.is_null(v) {
            if null_matches {
                out.write(rid, raw)?;
            }
        } else {
            if filter.matches(cmp, v, false) {
                out.write(rid, raw)?;
            }
            if view.track_min_max {
                mm.update(cmp, v);
            }
        }
        Ok(())
    })?;
    Ok(mm)
}
