//! Filtering and projection of fixed-width column blocks.
//!
//! A step compiles its predicates once with [`filter::compile`] and hands the
//! resulting [`ParsedColumnFilter`] by shared reference to every
//! [`scan::scan_block`] call of the step. Both are pure; nothing here holds
//! mutable state across calls.

pub mod config;
pub mod constants;
pub mod descriptor;
pub mod filter;
pub mod ops;
pub mod scan;
pub mod text;
pub mod wire;

pub use colblk_result::{Error, Result};
pub use config::ScanConfig;
pub use descriptor::ColumnDescriptor;
pub use filter::{CompiledFilter, FilterMode, ParsedColumnFilter, compile};
pub use ops::{BoolOp, CompareOp, OutputType};
pub use scan::{process_request, scan_block, worst_case_output_size};
pub use text::Collation;
pub use wire::{BlockFilterRequest, BlockScanResult, FilterPredicate, ResultHeader};
