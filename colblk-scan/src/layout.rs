//! How a logical block maps onto physical blocks.
//!
//! A logical block addresses [`ROWS_PER_LOGICAL_BLOCK`] rows. A column `width`
//! bytes wide stores them in `width` consecutive physical blocks, so physical
//! block `i` holds `16 / width` of the 16 RidFlags sub-ranges.

use colblk_column::constants::{BLOCK_SIZE, ROWS_PER_LOGICAL_BLOCK};
use colblk_result::{Error, Result};
use colblk_types::{LogicalType, sentinels};

/// `(shift, mask)` selecting the RidFlags bits of one physical block:
/// block `i` is needed iff `(rid_flags >> (i * shift)) & mask != 0`.
pub fn load_mask(width: usize) -> Result<(u32, u16)> {
    match width {
        1 => Ok((16, 0xFFFF)),
        2 => Ok((8, 0xFF)),
        4 => Ok((4, 0x0F)),
        8 => Ok((2, 0x03)),
        16 => Ok((1, 0x01)),
        _ => Err(Error::InvalidArgumentError(format!(
            "no physical block layout for width {width}"
        ))),
    }
}

/// Whether physical block `index` of a logical block holds any row selected
/// by `rid_flags`.
pub fn block_selected(width: usize, index: usize, rid_flags: u16) -> Result<bool> {
    let (shift, mask) = load_mask(width)?;
    let offset = index as u32 * shift;
    if offset >= u16::BITS {
        return Ok(false);
    }
    Ok((rid_flags >> offset) & mask != 0)
}

/// Indexes of the physical blocks to read. Scans read every one; steps read
/// only those holding selected rows.
pub fn physical_blocks_to_load(width: usize, rid_flags: u16, is_scan: bool) -> Result<Vec<usize>> {
    let mut out = Vec::with_capacity(width);
    for i in 0..width {
        if is_scan || block_selected(width, i, rid_flags)? {
            out.push(i);
        }
    }
    Ok(out)
}

/// Bytes of one logical block of a `width`-byte column.
#[inline]
pub fn logical_block_size(width: usize) -> usize {
    ROWS_PER_LOGICAL_BLOCK * width
}

/// Rows stored in one physical block.
#[inline]
pub fn rows_per_physical_block(width: usize) -> usize {
    BLOCK_SIZE / width
}

/// `rows` values of the column's EMPTY pattern, standing in for blocks that
/// were never allocated.
pub fn fill_empty_block(width: usize, logical_type: LogicalType, rows: usize) -> Result<Vec<u8>> {
    let empty = sentinels(width, logical_type)?.empty_bytes();
    let mut out = Vec::with_capacity(rows * width);
    for _ in 0..rows {
        out.extend_from_slice(&empty);
    }
    Ok(out)
}
