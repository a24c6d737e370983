#![allow(dead_code)]

use std::sync::Arc;

use colblk_column::constants::ROWS_PER_LOGICAL_BLOCK;
use colblk_column::{BoolOp, ColumnDescriptor, FilterPredicate, ScanConfig};
use colblk_scan::{ColumnCommand, ColumnCommandConfig, MemBlockSource};

/// One logical block of `width`-byte values, `value(row)` for every row.
pub fn logical_block(width: usize, value: impl Fn(usize) -> i128) -> Vec<u8> {
    let mut out = Vec::with_capacity(ROWS_PER_LOGICAL_BLOCK * width);
    for row in 0..ROWS_PER_LOGICAL_BLOCK {
        out.extend_from_slice(&value(row).to_le_bytes()[..width]);
    }
    out
}

/// Source holding `blocks` consecutive logical blocks of a column, the first
/// one at physical block 0.
pub fn column_source(
    width: usize,
    blocks: usize,
    value: impl Fn(usize, usize) -> i128,
) -> Arc<MemBlockSource> {
    let source = MemBlockSource::new();
    for b in 0..blocks {
        let data = logical_block(width, |row| value(b, row));
        source
            .insert_column((b * width) as u64, &data)
            .unwrap();
    }
    Arc::new(source)
}

pub fn command(desc: ColumnDescriptor, bop: BoolOp, preds: &[FilterPredicate]) -> ColumnCommand {
    ColumnCommand::with_predicates(
        desc,
        bop,
        preds,
        ColumnCommandConfig::default(),
        ScanConfig::default(),
    )
    .unwrap()
}
