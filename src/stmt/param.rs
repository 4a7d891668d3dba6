//! Tagged-union parameter value, the idiomatic replacement for
//! libattachsql's `ascore_stmt_param_st` C union + type-tag pair
//! (SPEC_FULL.md §4.5, §6).

use crate::declar::column_type::ColumnType;
use crate::stmt::datetime::{Date, DateTime, Time};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Tiny(i8),
    UnsignedTiny(u8),
    Short(i16),
    UnsignedShort(u16),
    Int(i32),
    UnsignedInt(u32),
    BigInt(i64),
    UnsignedBigInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
    /// Queued for COM_STMT_SEND_LONG_DATA; accumulated server-side and
    /// excluded from the value list of the following COM_STMT_EXECUTE.
    LongData,
}

impl ParamValue {
    /// The (type, is_unsigned) pair sent in COM_STMT_EXECUTE's parameter
    /// type array when `new_params_bound_flag` is 1.
    pub fn wire_type(&self) -> (ColumnType, bool) {
        match self {
            ParamValue::Null => (ColumnType::Null, false),
            ParamValue::Tiny(_) => (ColumnType::Tiny, false),
            ParamValue::UnsignedTiny(_) => (ColumnType::Tiny, true),
            ParamValue::Short(_) => (ColumnType::Short, false),
            ParamValue::UnsignedShort(_) => (ColumnType::Short, true),
            ParamValue::Int(_) => (ColumnType::Long, false),
            ParamValue::UnsignedInt(_) => (ColumnType::Long, true),
            ParamValue::BigInt(_) => (ColumnType::LongLong, false),
            ParamValue::UnsignedBigInt(_) => (ColumnType::LongLong, true),
            ParamValue::Float(_) => (ColumnType::Float, false),
            ParamValue::Double(_) => (ColumnType::Double, false),
            ParamValue::String(_) => (ColumnType::VarString, false),
            ParamValue::Binary(_) => (ColumnType::Blob, false),
            ParamValue::Date(_) => (ColumnType::Date, false),
            ParamValue::DateTime(_) => (ColumnType::DateTime, false),
            ParamValue::Time(_) => (ColumnType::Time, false),
            // Never actually placed on the wire: COM_STMT_SEND_LONG_DATA
            // is issued instead and this slot is skipped in the value list.
            ParamValue::LongData => (ColumnType::Blob, false),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Appends this value's on-wire encoding (everything except the NULL
    /// bitmap bit and the type byte pair, which the caller writes).
    pub fn encode_value(&self, out: &mut Vec<u8>) {
        use crate::codec::*;
        match self {
            ParamValue::Null | ParamValue::LongData => {}
            ParamValue::Tiny(v) => out.push(*v as u8),
            ParamValue::UnsignedTiny(v) => out.push(*v),
            ParamValue::Short(v) => write_u16_le(out, *v as u16),
            ParamValue::UnsignedShort(v) => write_u16_le(out, *v),
            ParamValue::Int(v) => write_u32_le(out, *v as u32),
            ParamValue::UnsignedInt(v) => write_u32_le(out, *v),
            ParamValue::BigInt(v) => write_u64_le(out, *v as u64),
            ParamValue::UnsignedBigInt(v) => write_u64_le(out, *v),
            ParamValue::Float(v) => write_f32_le(out, *v),
            ParamValue::Double(v) => write_f64_le(out, *v),
            ParamValue::String(s) => write_lenenc_str(out, s.as_bytes()),
            ParamValue::Binary(b) => write_lenenc_str(out, b),
            ParamValue::Date(d) => write_binary_datetime(out, d.year, d.month, d.day, 0, 0, 0, 0),
            ParamValue::DateTime(dt) => write_binary_datetime(
                out, dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second, dt.microsecond,
            ),
            ParamValue::Time(t) => {
                write_binary_time(out, t.is_negative, t.days, t.hour, t.minute, t.second, t.microsecond)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_marks_unsigned_variants() {
        assert_eq!(ParamValue::UnsignedInt(5).wire_type(), (ColumnType::Long, true));
        assert_eq!(ParamValue::Int(5).wire_type(), (ColumnType::Long, false));
    }

    #[test]
    fn long_data_encodes_to_nothing() {
        let mut out = Vec::new();
        ParamValue::LongData.encode_value(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn string_param_is_length_prefixed() {
        let mut out = Vec::new();
        ParamValue::String("hi".to_string()).encode_value(&mut out);
        assert_eq!(out, vec![2, b'h', b'i']);
    }
}
