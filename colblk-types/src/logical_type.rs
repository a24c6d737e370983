//! Storage catalog type tags.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Logical column type as numbered by the storage catalog.
///
/// The discriminants are stable wire values carried in the block-filter request
/// header; `num_enum` provides the `u8` conversions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum LogicalType {
    Bit = 0,
    TinyInt = 1,
    Char = 2,
    SmallInt = 3,
    Decimal = 4,
    MedInt = 5,
    Int = 6,
    Float = 7,
    Date = 8,
    BigInt = 9,
    Double = 10,
    DateTime = 11,
    VarChar = 12,
    VarBinary = 13,
    Clob = 14,
    Blob = 15,
    UTinyInt = 16,
    USmallInt = 17,
    UDecimal = 18,
    UMedInt = 19,
    UInt = 20,
    UFloat = 21,
    UBigInt = 22,
    UDouble = 23,
    Text = 24,
    Time = 25,
    Timestamp = 26,
}

/// Comparison family a column is scanned with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ColumnKind {
    /// Compared as signed integers.
    Signed,
    /// Compared as unsigned integers.
    Unsigned,
    /// Compared as IEEE-754 floats reinterpreted from the stored bits.
    Float,
    /// Padding-trimmed and compared bytewise under the column collation.
    Text,
}

impl LogicalType {
    pub fn kind(self) -> ColumnKind {
        use LogicalType::*;
        match self {
            Float | UFloat | Double | UDouble => ColumnKind::Float,
            Char | VarChar | Text => ColumnKind::Text,
            UTinyInt | USmallInt | UMedInt | UInt | UBigInt | UDecimal | Date | DateTime
            | Time | Timestamp => ColumnKind::Unsigned,
            Bit | TinyInt | SmallInt | MedInt | Int | BigInt | Decimal | VarBinary | Blob
            | Clob => ColumnKind::Signed,
        }
    }

    #[inline]
    pub fn is_decimal(self) -> bool {
        matches!(self, LogicalType::Decimal | LogicalType::UDecimal)
    }

    /// Date and time types compare as unsigned integers but store the character
    /// NULL patterns at every width except 4.
    #[inline]
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            LogicalType::Date | LogicalType::DateTime | LogicalType::Time | LogicalType::Timestamp
        )
    }

    #[inline]
    pub fn is_text(self) -> bool {
        self.kind() == ColumnKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(u8::from(LogicalType::BigInt), 9);
        assert_eq!(u8::from(LogicalType::UBigInt), 22);
        assert_eq!(LogicalType::try_from(24u8).unwrap(), LogicalType::Text);
        assert!(LogicalType::try_from(27u8).is_err());
    }

    #[test]
    fn kinds() {
        assert_eq!(LogicalType::Decimal.kind(), ColumnKind::Signed);
        assert_eq!(LogicalType::Date.kind(), ColumnKind::Unsigned);
        assert_eq!(LogicalType::Double.kind(), ColumnKind::Float);
        assert_eq!(LogicalType::VarChar.kind(), ColumnKind::Text);
        assert_eq!(LogicalType::Blob.kind(), ColumnKind::Signed);
        assert_eq!(LogicalType::VarBinary.kind(), ColumnKind::Signed);
        assert!(!LogicalType::Clob.is_text());
    }
}
