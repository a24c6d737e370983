//! Layout constants fixed by the block storage format.

/// Bytes in one physical block.
pub const BLOCK_SIZE: usize = 8192;

/// Rows addressed by one logical block, whatever the column width.
pub const ROWS_PER_LOGICAL_BLOCK: usize = 8192;

/// Bytes of a row index in requests and responses.
pub const RID_SIZE: usize = 2;

/// `rid >> RID_SUB_RANGE_SHIFT` selects the RidFlags bit for a row: 16 bits of
/// 512-row sub-ranges cover a logical block.
pub const RID_SUB_RANGE_SHIFT: u32 = 9;

/// Equality/inequality lists up to this size are searched linearly.
pub const MAX_ARRAY_FILTER_VALUES: usize = 8;

/// Bytes of a predicate record besides its value: operator and flag.
pub const PREDICATE_HEADER_SIZE: usize = 2;
