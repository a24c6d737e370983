//! Block scanner.
//!
//! [`scan_block`] evaluates a compiled filter over one block of fixed-width
//! values and writes the matching rows to an output payload. The hot loop is
//! monomorphized per (kind, width) pair; the dispatch happens once per block.
//!
//! Per value, in row order:
//! 1. the EMPTY pattern matches iff the filter matches EMPTY itself,
//! 2. the NULL pattern (and the legacy alternate for 8-byte text) matches iff
//!    the filter matches NULL,
//! 3. anything else goes through the filter's mode, and feeds min/max.
//!
//! When a row list is given, or the output carries row indexes, EMPTY rows are
//! skipped instead of evaluated.

mod minmax;
mod output;
mod row;
mod vertical;

use std::borrow::Cow;

use colblk_result::{Error, Result};
use colblk_types::ColumnKind;

use crate::config::ScanConfig;
use crate::descriptor::ColumnDescriptor;
use crate::filter::compare::{FloatCmp, SignedCmp, TextCmp, UnsignedCmp, ValueComparator};
use crate::filter::lane::Lane;
use crate::filter::{CompiledFilter, ParsedColumnFilter, compile};
use crate::ops::OutputType;
use crate::wire::{BlockFilterRequest, BlockScanResult, ResultHeader};
use minmax::MinMax;
use output::OutputWriter;

/// Largest payload a scan of `rows` candidate rows can produce.
///
/// Callers size the output capacity with this.
pub fn worst_case_output_size(rows: usize, output: OutputType, width: usize) -> usize {
    rows * output.entry_size(width)
}

/// Scan one block.
///
/// `rids` selects rows by index; an empty slice scans the whole block. Rows
/// are always emitted in ascending order. `capacity` bounds the payload when
/// [`ScanConfig::check_output_capacity`] is set.
pub fn scan_block(
    desc: &ColumnDescriptor,
    filter: &ParsedColumnFilter,
    block: &[u8],
    rids: &[u16],
    capacity: usize,
    config: &ScanConfig,
) -> Result<BlockScanResult> {
    desc.validate()?;
    let width = desc.width;
    if block.len() % width != 0 {
        return Err(Error::InvalidArgumentError(format!(
            "block of {} bytes is not a whole number of {width}-byte values",
            block.len()
        )));
    }
    let rows = block.len() / width;
    if rows > u16::MAX as usize {
        return Err(Error::InvalidArgumentError(format!(
            "block holds {rows} rows, row indexes are 16-bit"
        )));
    }
    if let Some(&bad) = rids.iter().find(|&&rid| rid as usize >= rows) {
        return Err(Error::InvalidArgumentError(format!(
            "row index {bad} outside block of {rows} rows"
        )));
    }

    let rids: Cow<'_, [u16]> = if rids.is_sorted() {
        Cow::Borrowed(rids)
    } else {
        let mut sorted = rids.to_vec();
        sorted.sort_unstable();
        Cow::Owned(sorted)
    };

    let pair = desc.sentinels()?;
    let mut out = OutputWriter::new(desc.output, width, capacity, config.check_output_capacity);
    let view = BlockView {
        block,
        rids: if rids.is_empty() { None } else { Some(rids.as_ref()) },
        rows,
        skip_empty: !rids.is_empty() || desc.output.emits_rid(),
        track_min_max: desc.tracks_min_max(rids.len(), config.max_min_max_width),
        signed: !matches!(desc.kind(), ColumnKind::Unsigned),
        null: pair.null,
        alt_null: pair.alt_null,
        empty: pair.empty,
    };

    let (min, max) = dispatch(desc, filter, &view, &mut out, config)?;
    let (payload, values_written, rid_flags) = out.finish();
    tracing::trace!(
        "[SCAN] width={} kind={:?} rows={} matched={}",
        width,
        desc.kind(),
        view.rid_count(),
        values_written
    );

    Ok(BlockScanResult {
        header: ResultHeader {
            values_written,
            rid_flags,
            valid_min_max: view.track_min_max,
            min,
            max,
            cache_io: 0,
            physical_io: 0,
        },
        payload,
    })
}

/// Decode a block filter request, compile its filter unless the caller
/// already holds the compiled form for the step, scan, and encode the result.
pub fn process_request(
    request: &[u8],
    block: &[u8],
    cached: Option<&ParsedColumnFilter>,
    capacity: usize,
    config: &ScanConfig,
) -> Result<Vec<u8>> {
    let req = BlockFilterRequest::decode(request)?;
    let compiled;
    let filter = match cached {
        Some(filter) => filter,
        None => {
            compiled = compile(
                &req.filter,
                req.descriptor.width,
                req.descriptor.logical_type,
                req.predicate_count,
                req.bop,
            )?;
            &compiled
        }
    };
    let result = scan_block(&req.descriptor, filter, block, &req.rids, capacity, config)?;
    Ok(result.encode())
}

fn dispatch(
    desc: &ColumnDescriptor,
    filter: &ParsedColumnFilter,
    view: &BlockView<'_>,
    out: &mut OutputWriter,
    config: &ScanConfig,
) -> Result<(i128, i128)> {
    use ColumnKind::*;
    use ParsedColumnFilter::{Narrow, Wide};

    let collation = desc.collation;
    match (desc.kind(), desc.width, filter) {
        (Signed, 1, Narrow(f)) => scan_typed::<i64, _, 1>(&SignedCmp, f, view, out, config),
        (Signed, 2, Narrow(f)) => scan_typed::<i64, _, 2>(&SignedCmp, f, view, out, config),
        (Signed, 4, Narrow(f)) => scan_typed::<i64, _, 4>(&SignedCmp, f, view, out, config),
        (Signed, 8, Narrow(f)) => scan_typed::<i64, _, 8>(&SignedCmp, f, view, out, config),
        (Signed, 16, Wide(f)) => scan_typed::<i128, _, 16>(&SignedCmp, f, view, out, config),
        (Unsigned, 1, Narrow(f)) => scan_typed::<i64, _, 1>(&UnsignedCmp, f, view, out, config),
        (Unsigned, 2, Narrow(f)) => scan_typed::<i64, _, 2>(&UnsignedCmp, f, view, out, config),
        (Unsigned, 4, Narrow(f)) => scan_typed::<i64, _, 4>(&UnsignedCmp, f, view, out, config),
        (Unsigned, 8, Narrow(f)) => scan_typed::<i64, _, 8>(&UnsignedCmp, f, view, out, config),
        (Float, 4, Narrow(f)) => scan_typed::<i64, _, 4>(&FloatCmp::<4>, f, view, out, config),
        (Float, 8, Narrow(f)) => scan_typed::<i64, _, 8>(&FloatCmp::<8>, f, view, out, config),
        (Text, 1, Narrow(f)) => {
            scan_typed::<i64, _, 1>(&TextCmp::<1> { collation }, f, view, out, config)
        }
        (Text, 2, Narrow(f)) => {
            scan_typed::<i64, _, 2>(&TextCmp::<2> { collation }, f, view, out, config)
        }
        (Text, 4, Narrow(f)) => {
            scan_typed::<i64, _, 4>(&TextCmp::<4> { collation }, f, view, out, config)
        }
        (Text, 8, Narrow(f)) => {
            scan_typed::<i64, _, 8>(&TextCmp::<8> { collation }, f, view, out, config)
        }
        (_, width, Narrow(_)) if width == 16 => Err(Error::InvalidArgumentError(
            "16-byte column given a narrow filter".into(),
        )),
        (_, _, Wide(_)) if desc.width != 16 => Err(Error::InvalidArgumentError(format!(
            "{}-byte column given a 16-byte filter",
            desc.width
        ))),
        (_, width, _) => Err(Error::unsupported_column(width, desc.logical_type)),
    }
}

/// One block plus the per-column facts the strategies need.
pub(crate) struct BlockView<'a> {
    block: &'a [u8],
    rids: Option<&'a [u16]>,
    rows: usize,
    skip_empty: bool,
    track_min_max: bool,
    signed: bool,
    null: u128,
    alt_null: Option<u128>,
    empty: u128,
}

impl<'a> BlockView<'a> {
    #[inline(always)]
    fn raw<const W: usize>(&self, rid: u16) -> &'a [u8] {
        let start = rid as usize * W;
        &self.block[start..start + W]
    }

    fn rid_count(&self) -> usize {
        self.rids.map_or(self.rows, <[u16]>::len)
    }

    /// Visit candidate rows in ascending order.
    #[inline(always)]
    fn try_for_each_rid(&self, mut f: impl FnMut(u16) -> Result<()>) -> Result<()> {
        match self.rids {
            Some(rids) => rids.iter().try_for_each(|&rid| f(rid)),
            None => (0..self.rows).try_for_each(|rid| f(rid as u16)),
        }
    }
}

/// Sentinels widened into the lane type of one specialization.
#[derive(Clone, Copy)]
pub(crate) struct Sentinels<L: Lane> {
    pub(crate) null: L,
    pub(crate) alt_null: Option<L>,
    pub(crate) empty: L,
}

impl<L: Lane> Sentinels<L> {
    fn widen(view: &BlockView<'_>, width: usize) -> Self {
        Self {
            null: L::from_pattern(view.null, width, view.signed),
            alt_null: view
                .alt_null
                .map(|bits| L::from_pattern(bits, width, view.signed)),
            empty: L::from_pattern(view.empty, width, view.signed),
        }
    }

    #[inline(always)]
    pub(crate) fn is_null(&self, v: L) -> bool {
        v == self.null || self.alt_null == Some(v)
    }
}

fn scan_typed<L: Lane, C: ValueComparator<L>, const W: usize>(
    cmp: &C,
    filter: &CompiledFilter<L>,
    view: &BlockView<'_>,
    out: &mut OutputWriter,
    config: &ScanConfig,
) -> Result<(i128, i128)> {
    let sentinels = Sentinels::<L>::widen(view, W);
    // Both sentinels are constants, so their outcome is decided once per block.
    let empty_matches = filter.matches(cmp, sentinels.empty, false);
    let null_matches = filter.matches(cmp, sentinels.null, true);

    let mm: MinMax<L> = if C::VERTICAL && config.vertical_filtering && filter.flags_all_zero() {
        vertical::scan::<L, C, W>(cmp, filter, view, &sentinels, null_matches, out)?
    } else {
        row::scan::<L, C, W>(
            cmp,
            filter,
            view,
            &sentinels,
            empty_matches,
            null_matches,
            out,
        )?
    };
    Ok(mm.finish(cmp))
}
