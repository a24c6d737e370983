//! Error types and result definitions for the column block engine.
//!
//! Every crate in the workspace returns [`Result<T>`], whose error variant is the
//! single [`Error`] enum defined here. Errors propagate upward with `?`; the only
//! layer allowed to swallow an error is the job scheduler, which logs a failing
//! job and keeps unrelated transactions running.
//!
//! # Error Categories
//!
//! - **Invariant violations** ([`Error::UnknownOperator`], [`Error::UnsupportedColumn`],
//!   [`Error::OutputBufferTooSmall`]): fatal to the current request, never retried
//! - **Arithmetic overflow** ([`Error::Overflow`]): decimal range violations, fatal to the query
//! - **Caller input** ([`Error::InvalidArgumentError`], [`Error::Decode`]): malformed requests
//! - **Job failures** ([`Error::JobFailed`]): reported back on a job's reply channel
//! - **Internal errors** ([`Error::Internal`]): bugs or unexpected states

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
