//! Column command layer.
//!
//! Sits between a query step and the block scanner: loads the physical blocks
//! a request needs through a [`BlockSource`], scans them with the step's shared
//! compiled filter, decodes the response into row-index and value vectors, and
//! records block min/max for zone-map pruning. [`ScanStep`] runs a command over
//! many blocks as jobs on the [`FairThreadPool`](colblk_threadpool::FairThreadPool).

pub mod command;
pub mod config;
pub mod job;
pub mod layout;
pub mod source;

pub use colblk_result::{Error, Result};
pub use command::{BlockRef, ColumnCommand, StepInput, StepOutput, ZoneMapEntry};
pub use config::ColumnCommandConfig;
pub use job::{Backpressure, BlockScanJob, BlockTask, ScanStep};
pub use layout::{fill_empty_block, load_mask, physical_blocks_to_load};
pub use source::{BlockSource, LoadOutcome, MemBlockSource};
