#![allow(dead_code)]

use colblk_column::{
    BlockScanResult, BoolOp, ColumnDescriptor, FilterPredicate, ParsedColumnFilter, ScanConfig,
    compile, scan_block, worst_case_output_size, wire::encode_predicates,
};
use colblk_types::codecs::narrow_le;
use colblk_types::sentinels;

/// Pack integers into a block of `width`-byte little-endian values.
pub fn int_block(values: &[i128], width: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * width);
    for &v in values {
        narrow_le(v, width, &mut out);
    }
    out
}

/// Pack strings into NUL-padded `width`-byte cells.
pub fn text_block(values: &[&str], width: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * width);
    for v in values {
        out.extend_from_slice(&text_cell(v, width));
    }
    out
}

pub fn text_cell(s: &str, width: usize) -> Vec<u8> {
    let mut cell = s.as_bytes().to_vec();
    assert!(cell.len() <= width, "{s:?} does not fit in {width} bytes");
    cell.resize(width, 0);
    cell
}

/// Overwrite row `rid` with the column's NULL pattern.
pub fn set_null(block: &mut [u8], desc: &ColumnDescriptor, rid: usize) {
    let bytes = sentinels(desc.width, desc.logical_type).unwrap().null_bytes();
    block[rid * desc.width..(rid + 1) * desc.width].copy_from_slice(&bytes);
}

/// Overwrite row `rid` with the column's EMPTY pattern.
pub fn set_empty(block: &mut [u8], desc: &ColumnDescriptor, rid: usize) {
    let bytes = sentinels(desc.width, desc.logical_type).unwrap().empty_bytes();
    block[rid * desc.width..(rid + 1) * desc.width].copy_from_slice(&bytes);
}

pub fn compile_preds(
    desc: &ColumnDescriptor,
    bop: BoolOp,
    preds: &[FilterPredicate],
) -> ParsedColumnFilter {
    compile(
        &encode_predicates(preds),
        desc.width,
        desc.logical_type,
        preds.len() as u16,
        bop,
    )
    .unwrap()
}

/// Scan with a capacity that always fits.
pub fn scan_with(
    desc: &ColumnDescriptor,
    filter: &ParsedColumnFilter,
    block: &[u8],
    rids: &[u16],
    config: &ScanConfig,
) -> BlockScanResult {
    let rows = block.len() / desc.width;
    let capacity = worst_case_output_size(rows, desc.output, desc.width);
    scan_block(desc, filter, block, rids, capacity, config).unwrap()
}

pub fn scan(
    desc: &ColumnDescriptor,
    bop: BoolOp,
    preds: &[FilterPredicate],
    block: &[u8],
) -> BlockScanResult {
    let filter = compile_preds(desc, bop, preds);
    scan_with(desc, &filter, block, &[], &ScanConfig::default())
}

/// Row indexes of a result produced with an output type that emits them.
pub fn rids_of(result: &BlockScanResult, desc: &ColumnDescriptor) -> Vec<u16> {
    result
        .entries(desc.output, desc.width)
        .map(|(rid, _)| rid.unwrap())
        .collect()
}
