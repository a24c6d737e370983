//! Weighted fair job scheduler.
//!
//! [`FairThreadPool`] runs [`Job`]s on a fixed set of worker threads per
//! [`Priority`] class plus elastic "extra" threads that stand in for workers
//! blocked on downstream backpressure. Jobs are grouped by transaction: within
//! a transaction they run FIFO, across transactions the one that has consumed
//! the least weight goes next.

pub mod config;
pub mod job;
pub mod pool;
mod queue;

pub use colblk_result::{Error, Result};
pub use config::ThreadPoolConfig;
pub use job::{Job, JobFailure, JobFunctor, JobStatus, Priority, TxnId};
pub use pool::{BlockedCounter, BlockedGuard, FairThreadPool, ThreadCounts};
