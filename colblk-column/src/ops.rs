//! Operator enumerations with stable wire values.

use colblk_result::{Error, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bit that negates [`CompareOp::Like`].
pub const COMPARE_NOT: u8 = 0x08;

/// Comparison applied by one filter predicate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CompareOp {
    /// Never true for an ordinary value; only the NULL/EMPTY pre-checks can match it.
    Nil = 0,
    Lt = 1,
    Eq = 2,
    Le = 3,
    Gt = 4,
    Ne = 5,
    Ge = 6,
    Like = 0x10,
    NotLike = 0x18,
}

impl CompareOp {
    /// Decode an operator byte; unknown bytes mean a corrupted filter.
    pub fn from_wire(byte: u8) -> Result<Self> {
        CompareOp::try_from(byte).map_err(|_| Error::UnknownOperator(byte))
    }

    #[inline]
    pub fn is_like(self) -> bool {
        matches!(self, CompareOp::Like | CompareOp::NotLike)
    }
}

/// Combinator joining the predicates of one filter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BoolOp {
    None = 0,
    And = 1,
    Or = 2,
    Xor = 3,
}

impl BoolOp {
    pub fn from_wire(byte: u8) -> Result<Self> {
        BoolOp::try_from(byte)
            .map_err(|_| Error::InvalidArgumentError(format!("unknown combinator {byte}")))
    }
}

/// Output-type selector: which parts of a match are emitted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OutputType(u8);

impl OutputType {
    pub const RID: OutputType = OutputType(0x01);
    pub const VALUE: OutputType = OutputType(0x02);
    pub const BOTH: OutputType = OutputType(0x03);

    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0x01..=0x03 => Ok(OutputType(bits)),
            _ => Err(Error::InvalidArgumentError(format!(
                "output type mask 0x{bits:02x} selects nothing valid"
            ))),
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn emits_rid(self) -> bool {
        self.0 & Self::RID.0 != 0
    }

    #[inline]
    pub fn emits_value(self) -> bool {
        self.0 & Self::VALUE.0 != 0
    }

    /// Bytes per emitted match for a column of `width` bytes.
    pub fn entry_size(self, width: usize) -> usize {
        let mut n = 0;
        if self.emits_rid() {
            n += crate::constants::RID_SIZE;
        }
        if self.emits_value() {
            n += width;
        }
        n
    }
}
