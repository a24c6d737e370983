use std::{fmt, io};
use thiserror::Error;

/// Unified error type for the filtering, scanning and scheduling layers.
///
/// Each variant carries enough context to produce a descriptive query failure
/// message. Nothing in this workspace clamps or wraps a value to hide one of
/// these conditions.
///
/// # Thread Safety
///
/// `Error` is `Send` and `Sync`, so failures can be carried across the worker
/// threads of the job scheduler and into reply channels.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error raised by a block source backed by files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid caller input.
    ///
    /// Raised for a request whose shape cannot be processed, for example:
    /// - more than one predicate with no combinator
    /// - a block whose length is not a multiple of the column width
    /// - a row index that falls outside the block
    /// - decimal text that does not parse
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Unrecognized comparison operator byte in a filter blob.
    ///
    /// This indicates a corrupted filter from the planning layer and is never
    /// retried.
    #[error("unknown comparison operator 0x{0:02x}")]
    UnknownOperator(u8),

    /// No scanner specialization exists for the width/type combination.
    #[error("column width {width} is not implemented for type {logical_type}")]
    UnsupportedColumn { width: usize, logical_type: String },

    /// A write would exceed the caller-supplied output capacity.
    #[error("output buffer overflow: need {needed} bytes, capacity is {capacity}")]
    OutputBufferTooSmall { needed: usize, capacity: usize },

    /// Decimal arithmetic overflow.
    ///
    /// `lhs` and `rhs` describe the operand storage types (for example
    /// `"i64"` or `"i128"`), not their values.
    #[error("overflow in {op}: operands {lhs} and {rhs}")]
    Overflow {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Truncated or malformed wire message.
    #[error("decode error: {0}")]
    Decode(String),

    /// A scheduled job failed; the message is the failure reported by its worker.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an overflow error for `op` applied to operands of the given storage types.
    #[inline]
    pub fn overflow(op: &'static str, lhs: &'static str, rhs: &'static str) -> Self {
        Error::Overflow { op, lhs, rhs }
    }

    /// Create a decode error from any displayable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use colblk_result::Error;
    ///
    /// let err = Error::decode("request header truncated");
    /// assert!(matches!(err, Error::Decode(msg) if msg.contains("truncated")));
    /// ```
    #[inline]
    pub fn decode<E: fmt::Display>(err: E) -> Self {
        Error::Decode(err.to_string())
    }

    /// Create an unsupported column error.
    #[inline]
    pub fn unsupported_column(width: usize, logical_type: impl fmt::Debug) -> Self {
        Error::UnsupportedColumn {
            width,
            logical_type: format!("{logical_type:?}"),
        }
    }

    /// Whether the error is an invariant violation that must abort the step.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::UnknownOperator(_)
                | Error::UnsupportedColumn { .. }
                | Error::OutputBufferTooSmall { .. }
                | Error::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_message_names_operation_and_operands() {
        let err = Error::overflow("multiply", "i128", "i128");
        assert_eq!(
            err.to_string(),
            "overflow in multiply: operands i128 and i128"
        );
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn unknown_operator_is_invariant_violation() {
        let err = Error::UnknownOperator(0x42);
        assert_eq!(err.to_string(), "unknown comparison operator 0x42");
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
