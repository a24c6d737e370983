//! Per-step column description handed to the scanner.

use colblk_result::{Error, Result};
use colblk_types::{ColumnKind, LogicalType, SentinelPair, sentinels};

use crate::ops::OutputType;
use crate::text::Collation;

/// Shape of the column being scanned and what to emit for each match.
///
/// Built once per column per step and shared read-only by every block scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub width: usize,
    pub logical_type: LogicalType,
    pub scale: i8,
    pub precision: u8,
    pub output: OutputType,
    /// Full block scan, as opposed to a step driven by an input row list.
    pub is_scan: bool,
    pub collation: Collation,
}

impl ColumnDescriptor {
    pub fn new(width: usize, logical_type: LogicalType) -> Self {
        Self {
            width,
            logical_type,
            scale: 0,
            precision: 0,
            output: OutputType::VALUE,
            is_scan: true,
            collation: Collation::Binary,
        }
    }

    pub fn with_output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }

    pub fn with_decimal(mut self, scale: i8, precision: u8) -> Self {
        self.scale = scale;
        self.precision = precision;
        self
    }

    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    pub fn as_step(mut self) -> Self {
        self.is_scan = false;
        self
    }

    /// Comparison family used by the scanner. Every 16-byte column compares as
    /// a signed wide integer.
    pub fn kind(&self) -> ColumnKind {
        match (self.logical_type.kind(), self.width) {
            (ColumnKind::Unsigned, 16) => ColumnKind::Signed,
            (kind, _) => kind,
        }
    }

    pub fn sentinels(&self) -> Result<SentinelPair> {
        sentinels(self.width, self.logical_type)
    }

    /// Reject shapes the scanner has no specialization for.
    pub fn validate(&self) -> Result<()> {
        let supported = match (self.kind(), self.width) {
            (ColumnKind::Signed | ColumnKind::Unsigned, 1 | 2 | 4 | 8) => true,
            (ColumnKind::Signed, 16) => true,
            (ColumnKind::Float, 4 | 8) => true,
            (ColumnKind::Text, 1 | 2 | 4 | 8) => true,
            _ => false,
        };
        if !supported {
            return Err(Error::unsupported_column(self.width, self.logical_type));
        }
        Ok(())
    }

    /// Whether a scan of this column reports its min/max.
    ///
    /// Only full scans (no input rows) qualify. Narrow text, integer, temporal
    /// and decimal types are tracked; floats and wide text are not.
    pub fn tracks_min_max(&self, rid_count: usize, max_width: usize) -> bool {
        if rid_count != 0 || self.width > max_width {
            return false;
        }
        use LogicalType::*;
        match self.logical_type {
            Char => self.width <= 8,
            VarChar | Blob | Text => self.width < 8,
            TinyInt | SmallInt | MedInt | Int | BigInt | Date | DateTime | Time | Timestamp
            | UTinyInt | USmallInt | UMedInt | UInt | UBigInt => true,
            Decimal | UDecimal => true,
            _ => false,
        }
    }
}
