//! Column command: one column's filter applied block by block.
//!
//! A command is built once per column per step. Each [`ColumnCommand::execute`]
//! loads one logical block through a [`BlockSource`], runs the block scanner
//! over it, and decodes the scanner's response into row-index and value
//! vectors ready for the next command of the step.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use colblk_column::constants::{BLOCK_SIZE, ROWS_PER_LOGICAL_BLOCK};
use colblk_column::wire::encode_predicates;
use colblk_column::{
    BlockScanResult, BoolOp, ColumnDescriptor, FilterPredicate, ParsedColumnFilter, ResultHeader,
    ScanConfig, compile, scan_block, worst_case_output_size,
};
use colblk_result::{Error, Result};
use colblk_types::ColumnKind;
use colblk_types::codecs::widen_le;
use rustc_hash::FxHashMap;

use crate::config::ColumnCommandConfig;
use crate::layout::{block_selected, fill_empty_block, logical_block_size, rows_per_physical_block};
use crate::source::BlockSource;

/// One logical block: the id of its first physical block and the absolute row
/// id of its first row.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BlockRef {
    pub lbid: u64,
    pub base_rid: u64,
}

impl BlockRef {
    pub fn new(lbid: u64, base_rid: u64) -> Self {
        Self { lbid, base_rid }
    }
}

/// Rows surviving the previous command of a step.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StepInput {
    pub rel_rids: Vec<u16>,
    /// RidFlags summary of `rel_rids`.
    pub rid_map: u16,
}

impl StepInput {
    pub fn from_rids(rel_rids: Vec<u16>) -> Self {
        let rid_map = rel_rids.iter().fold(0u16, |acc, &rid| {
            acc | 1 << (rid >> colblk_column::constants::RID_SUB_RANGE_SHIFT).min(15)
        });
        Self { rel_rids, rid_map }
    }

    pub fn is_empty(&self) -> bool {
        self.rel_rids.is_empty()
    }
}

/// Min/max recorded for one block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ZoneMapEntry {
    Narrow { min: i64, max: i64 },
    Wide { min: i128, max: i128 },
}

/// Decoded result of one command on one block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutput {
    pub block: BlockRef,
    pub header: ResultHeader,
    pub rel_rids: Vec<u16>,
    /// Filled when [`ColumnCommandConfig::make_abs_rids`] is set.
    pub abs_rids: Vec<u64>,
    /// Values of columns up to 8 bytes wide, sign- or zero-extended.
    pub values: Vec<i64>,
    /// Values of 16-byte columns.
    pub wide_values: Vec<i128>,
    pub rid_map: u16,
    pub min_max: Option<ZoneMapEntry>,
}

impl StepOutput {
    fn empty(block: BlockRef) -> Self {
        Self {
            block,
            ..Self::default()
        }
    }

    /// Matched rows.
    pub fn len(&self) -> usize {
        self.header.values_written as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feed the matched rows to the next command of the step.
    pub fn as_input(&self) -> StepInput {
        StepInput {
            rel_rids: self.rel_rids.clone(),
            rid_map: self.rid_map,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A column, its compiled filter, and what to do with the matches.
pub struct ColumnCommand {
    desc: ColumnDescriptor,
    filter: Arc<ParsedColumnFilter>,
    config: ColumnCommandConfig,
    scan_config: ScanConfig,
    zone_map: Mutex<FxHashMap<u64, ZoneMapEntry>>,
}

impl ColumnCommand {
    pub fn new(
        desc: ColumnDescriptor,
        filter: Arc<ParsedColumnFilter>,
        config: ColumnCommandConfig,
        scan_config: ScanConfig,
    ) -> Result<Self> {
        desc.validate()?;
        let filter_wide = matches!(filter.as_ref(), ParsedColumnFilter::Wide(_));
        if filter_wide != (desc.width == 16) {
            return Err(Error::InvalidArgumentError(format!(
                "filter compiled for another width than {}",
                desc.width
            )));
        }
        Ok(Self {
            desc,
            filter,
            config,
            scan_config,
            zone_map: Mutex::new(FxHashMap::default()),
        })
    }

    /// Compile `preds` for the column and build the command.
    pub fn with_predicates(
        desc: ColumnDescriptor,
        bop: BoolOp,
        preds: &[FilterPredicate],
        config: ColumnCommandConfig,
        scan_config: ScanConfig,
    ) -> Result<Self> {
        let count = u16::try_from(preds.len()).map_err(|_| {
            Error::InvalidArgumentError(format!("{} predicates exceed u16", preds.len()))
        })?;
        let filter = compile(
            &encode_predicates(preds),
            desc.width,
            desc.logical_type,
            count,
            bop,
        )?;
        Self::new(desc, Arc::new(filter), config, scan_config)
    }

    /// Command with no filter: every candidate row is emitted.
    pub fn projection(
        desc: ColumnDescriptor,
        config: ColumnCommandConfig,
        scan_config: ScanConfig,
    ) -> Result<Self> {
        let filter = ParsedColumnFilter::always_true(desc.width);
        Self::new(desc, Arc::new(filter), config, scan_config)
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.desc
    }

    pub fn filter(&self) -> &Arc<ParsedColumnFilter> {
        &self.filter
    }

    pub fn is_scan(&self) -> bool {
        self.desc.is_scan
    }

    /// Min/max captured for block `lbid`, if a scan recorded one.
    pub fn zone_entry(&self, lbid: u64) -> Option<ZoneMapEntry> {
        lock(&self.zone_map).get(&lbid).copied()
    }

    /// Every captured min/max, ordered by block id.
    pub fn zone_map(&self) -> Vec<(u64, ZoneMapEntry)> {
        let mut entries: Vec<_> = lock(&self.zone_map)
            .iter()
            .map(|(&lbid, &entry)| (lbid, entry))
            .collect();
        entries.sort_unstable_by_key(|&(lbid, _)| lbid);
        entries
    }

    /// Run the command on one logical block.
    ///
    /// Scans ignore `input` and consider every row. Steps consider only the
    /// rows of `input`; with no input rows nothing is loaded or scanned.
    pub fn execute(
        &self,
        source: &dyn BlockSource,
        block: BlockRef,
        input: Option<&StepInput>,
    ) -> Result<StepOutput> {
        let (rids, rid_flags) = if self.desc.is_scan {
            (&[][..], u16::MAX)
        } else {
            match input {
                Some(input) if !input.is_empty() => (input.rel_rids.as_slice(), input.rid_map),
                _ => {
                    tracing::debug!("[COLCMD] block {} step has no input rows", block.lbid);
                    return Ok(StepOutput::empty(block));
                }
            }
        };

        let mut data = vec![0u8; logical_block_size(self.desc.width)];
        let (cache_io, physical_io) = self.load(source, block.lbid, rid_flags, &mut data)?;

        let candidates = if rids.is_empty() {
            ROWS_PER_LOGICAL_BLOCK
        } else {
            rids.len()
        };
        let capacity = worst_case_output_size(candidates, self.desc.output, self.desc.width);
        let mut result = scan_block(
            &self.desc,
            &self.filter,
            &data,
            rids,
            capacity,
            &self.scan_config,
        )?;
        result.header.cache_io = cache_io;
        result.header.physical_io = physical_io;

        let out = self.process_result(block, &result)?;
        tracing::trace!(
            "[COLCMD] block {} matched {} (cache={} physical={})",
            block.lbid,
            out.len(),
            cache_io,
            physical_io
        );
        Ok(out)
    }

    /// Read the physical blocks the request needs into `data`. Returns the
    /// cache-hit and physical-read counts.
    fn load(
        &self,
        source: &dyn BlockSource,
        lbid: u64,
        rid_flags: u16,
        data: &mut [u8],
    ) -> Result<(u32, u32)> {
        let width = self.desc.width;
        let last = source.last_lbid();
        let mut past_last = false;
        let (mut cache_io, mut physical_io) = (0u32, 0u32);
        for (i, chunk) in data.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            let phys = lbid + i as u64;
            if self.desc.is_scan && past_last {
                let empty = fill_empty_block(
                    width,
                    self.desc.logical_type,
                    rows_per_physical_block(width),
                )?;
                chunk.copy_from_slice(&empty);
            } else if self.desc.is_scan || block_selected(width, i, rid_flags)? {
                if source.load(phys, chunk)?.cache_hit {
                    cache_io += 1;
                } else {
                    physical_io += 1;
                }
            }
            if last == Some(phys) {
                past_last = true;
            }
        }
        Ok((cache_io, physical_io))
    }

    fn process_result(&self, block: BlockRef, result: &BlockScanResult) -> Result<StepOutput> {
        let width = self.desc.width;
        let output = self.desc.output;
        let n = result.rows_matched();
        let mut out = StepOutput::empty(block);
        out.header = result.header;
        out.rid_map = result.header.rid_flags;
        if output.emits_rid() {
            out.rel_rids.reserve(n);
            if self.config.make_abs_rids {
                out.abs_rids.reserve(n);
            }
        }

        let signed = self.desc.kind() != ColumnKind::Unsigned;
        for (rid, value) in result.entries(output, width) {
            if let Some(rid) = rid {
                out.rel_rids.push(rid);
                if self.config.make_abs_rids {
                    out.abs_rids.push(block.base_rid + rid as u64);
                }
            }
            if let Some(bytes) = value {
                if width == 16 {
                    let raw: [u8; 16] = bytes
                        .try_into()
                        .map_err(|_| Error::decode("short 16-byte value in scan output"))?;
                    out.wide_values.push(i128::from_le_bytes(raw));
                } else {
                    out.values.push(widen_le(bytes, signed));
                }
            }
        }

        if self.desc.is_scan && self.config.capture_min_max && result.header.valid_min_max {
            let entry = if width == 16 {
                ZoneMapEntry::Wide {
                    min: result.header.min,
                    max: result.header.max,
                }
            } else {
                ZoneMapEntry::Narrow {
                    min: result.header.min as i64,
                    max: result.header.max as i64,
                }
            };
            lock(&self.zone_map).insert(block.lbid, entry);
            out.min_max = Some(entry);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for ColumnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnCommand")
            .field("desc", &self.desc)
            .field("mode", &self.filter.mode())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_rid_map_marks_sub_ranges() {
        let input = StepInput::from_rids(vec![0, 511, 512, 8191]);
        assert_eq!(input.rid_map, 0b1000_0000_0000_0011);
    }

    #[test]
    fn filter_width_must_match_column() {
        let desc = ColumnDescriptor::new(16, colblk_types::LogicalType::Decimal);
        let narrow = Arc::new(ParsedColumnFilter::always_true(8));
        let err = ColumnCommand::new(
            desc,
            narrow,
            ColumnCommandConfig::default(),
            ScanConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }
}
