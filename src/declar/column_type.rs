//! Column type identifiers used in column-definition packets and in the
//! binary protocol's parameter/row type bytes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    NewDate = 14,
    VarChar = 15,
    Bit = 16,
    Timestamp2 = 17,
    DateTime2 = 18,
    Time2 = 19,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl ColumnType {
    /// Parameters/results of these types carry no value bytes beyond the
    /// NULL bitmap -- only `Null` itself.
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnType::Null)
    }

    /// Whether the binary protocol represents this type with the
    /// length-encoded-string framing used by VARCHAR/BLOB/DECIMAL/etc.
    pub fn is_str_like(&self) -> bool {
        matches!(
            self,
            ColumnType::Decimal
                | ColumnType::NewDecimal
                | ColumnType::VarChar
                | ColumnType::Bit
                | ColumnType::Enum
                | ColumnType::Set
                | ColumnType::TinyBlob
                | ColumnType::MediumBlob
                | ColumnType::LongBlob
                | ColumnType::Blob
                | ColumnType::VarString
                | ColumnType::String
                | ColumnType::Geometry
                | ColumnType::Json
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        let byte: u8 = ColumnType::VarString.into();
        assert_eq!(byte, 253);
        assert_eq!(ColumnType::try_from(253u8).unwrap(), ColumnType::VarString);
    }

    #[test]
    fn unknown_byte_fails() {
        assert!(ColumnType::try_from(200u8).is_err());
    }
}
