//! colblk: filtering and projection of fixed-width column blocks
//!
//! This crate is the entrypoint of the workspace. It re-exports the block
//! scanner, the value types it filters, the command layer that drives it block
//! by block, and the fair scheduler the commands run on.
//!
//! # Quick Start
//!
//! Scan one block of 4-byte integers for values between 10 and 20:
//!
//! ```rust
//! use colblk::column::{
//!     BoolOp, ColumnDescriptor, CompareOp, FilterPredicate, OutputType, ScanConfig,
//! };
//! use colblk::types::LogicalType;
//!
//! let desc = ColumnDescriptor::new(4, LogicalType::Int).with_output(OutputType::RID);
//! let preds = [
//!     FilterPredicate::int(CompareOp::Gt, 10, 4),
//!     FilterPredicate::int(CompareOp::Lt, 20, 4),
//! ];
//! let filter = colblk::column::compile(
//!     &colblk::column::wire::encode_predicates(&preds),
//!     desc.width,
//!     desc.logical_type,
//!     preds.len() as u16,
//!     BoolOp::And,
//! )
//! .unwrap();
//!
//! let block: Vec<u8> = (0i32..32).flat_map(i32::to_le_bytes).collect();
//! let capacity = colblk::column::worst_case_output_size(32, desc.output, desc.width);
//! let result =
//!     colblk::column::scan_block(&desc, &filter, &block, &[], capacity, &ScanConfig::default())
//!         .unwrap();
//! assert_eq!(result.rows_matched(), 9);
//! ```
//!
//! # Architecture
//!
//! - **Values** (`colblk-types`): the 128-bit decimal, logical type tags and
//!   the NULL/EMPTY sentinel table.
//! - **Scanner** (`colblk-column`): filter compiler, block scanner, wire formats.
//! - **Commands** (`colblk-scan`): block loading, result decoding, zone maps,
//!   scheduler jobs.
//! - **Scheduler** (`colblk-threadpool`): weighted fair thread pool.

pub use colblk_result::{Error, Result};

pub mod types {
    //! Value types and storage-format tags.

    pub use colblk_types::*;
}

pub mod column {
    //! Filter compiler and block scanner.

    pub use colblk_column::*;
}

pub mod scan {
    //! Column commands and scan jobs.

    pub use colblk_scan::*;
}

pub mod threadpool {
    //! Weighted fair job scheduler.

    pub use colblk_threadpool::*;
}

pub use colblk_column::{ParsedColumnFilter, ScanConfig, scan_block};
pub use colblk_scan::{ColumnCommand, ScanStep};
pub use colblk_threadpool::FairThreadPool;
pub use colblk_types::{Decimal, WideInt};
