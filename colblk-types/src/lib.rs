//! Value types shared by the column filter engine.
//!
//! - [`WideInt`]: the 128-bit signed payload with its reserved NULL/EMPTY patterns
//! - [`Decimal`]: a scaled decimal over narrow (`i64`) or wide (`i128`) storage,
//!   with overflow-checked arithmetic specialised by [`arith::DecimalInt`] and
//!   [`arith::OverflowPolicy`]
//! - [`LogicalType`] / [`ColumnKind`]: storage catalog type tags and the
//!   comparison family each one scans with
//! - [`sentinel`]: the (width, logical type) lookup table of NULL/EMPTY patterns
//! - [`codecs`]: explicit little-endian wire helpers

pub mod arith;
pub mod codecs;
pub mod decimal;
pub mod logical_type;
pub mod sentinel;
pub mod wide;

pub use arith::{Checked, DecimalInt, OverflowPolicy, Wrapping};
pub use decimal::{Decimal, DecimalStorage, MAX_DECIMAL_PRECISION, MAX_NARROW_PRECISION};
pub use logical_type::{ColumnKind, LogicalType};
pub use sentinel::{SentinelPair, sentinels};
pub use wide::WideInt;
