//! Binary protocol result row (SPEC_FULL.md §4.5): a NULL bitmap (offset by
//! 2, per `Protocol::BinaryResultsetRow`) followed by one value per
//! non-NULL column, encoded according to its column type.

use std::fmt;

use crate::codec::Reader;
use crate::declar::column_type::ColumnType;
use crate::error::CResult;

/// A single decoded binary-protocol value. `Bytes` covers every string-like
/// and BLOB-like type; numeric/date types are decoded to native Rust types.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryValue {
    Null,
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Date {
        year: u16,
        month: u8,
        day: u8,
    },
    DateTime {
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        microsecond: u32,
    },
    Time {
        is_negative: bool,
        days: u32,
        hour: u8,
        minute: u8,
        second: u8,
        microsecond: u32,
    },
}

/// Decimal-text rendering used by `Statement::get_char` (SPEC_FULL.md §4.5):
/// numeric variants render their plain decimal form, `Bytes` is decoded as
/// UTF-8 (lossily, since column collation isn't tracked here), and the
/// date/time variants use `YYYY-MM-DD[ HH:MM:SS[.ffffff]]`.
impl fmt::Display for BinaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryValue::Null => Ok(()),
            BinaryValue::Signed(v) => write!(f, "{v}"),
            BinaryValue::Unsigned(v) => write!(f, "{v}"),
            BinaryValue::Float(v) => write!(f, "{v}"),
            BinaryValue::Double(v) => write!(f, "{v}"),
            BinaryValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            BinaryValue::Date { year, month, day } => {
                write!(f, "{year:04}-{month:02}-{day:02}")
            }
            BinaryValue::DateTime {
                year,
                month,
                day,
                hour,
                minute,
                second,
                microsecond,
            } => {
                write!(f, "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")?;
                if *microsecond > 0 {
                    write!(f, ".{microsecond:06}")?;
                }
                Ok(())
            }
            BinaryValue::Time {
                is_negative,
                days,
                hour,
                minute,
                second,
                microsecond,
            } => {
                if *is_negative {
                    write!(f, "-")?;
                }
                let total_hours = *days as u64 * 24 + *hour as u64;
                write!(f, "{total_hours:02}:{minute:02}:{second:02}")?;
                if *microsecond > 0 {
                    write!(f, ".{microsecond:06}")?;
                }
                Ok(())
            }
        }
    }
}

pub fn null_bitmap_len(column_count: usize) -> usize {
    (column_count + 7 + 2) / 8
}

#[derive(Debug, Clone)]
pub struct BinaryRow {
    pub values: Vec<BinaryValue>,
}

impl BinaryRow {
    pub fn parse(
        packet: &[u8],
        columns: &[crate::packet::column_def::ColumnDefinition],
        unsigned_flags: &[bool],
    ) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0x00 packet header

        let bitmap = r.read_bytes(null_bitmap_len(columns.len()))?;
        let mut values = Vec::with_capacity(columns.len());

        for (i, col) in columns.iter().enumerate() {
            let bit_index = i + 2;
            let is_null = (bitmap[bit_index / 8] >> (bit_index % 8)) & 1 != 0;
            if is_null {
                values.push(BinaryValue::Null);
                continue;
            }
            let unsigned = unsigned_flags.get(i).copied().unwrap_or(false);
            values.push(read_value(&mut r, col.column_type, unsigned)?);
        }

        Ok(BinaryRow { values })
    }

    pub fn get(&self, index: usize) -> Option<&BinaryValue> {
        self.values.get(index)
    }
}

fn read_value(r: &mut Reader, ty: ColumnType, unsigned: bool) -> CResult<BinaryValue> {
    use ColumnType::*;
    Ok(match ty {
        Tiny => {
            let b = r.read_u8()?;
            if unsigned {
                BinaryValue::Unsigned(b as u64)
            } else {
                BinaryValue::Signed(b as i8 as i64)
            }
        }
        Short | Year => {
            let v = r.read_u16_le()?;
            if unsigned {
                BinaryValue::Unsigned(v as u64)
            } else {
                BinaryValue::Signed(v as i16 as i64)
            }
        }
        Long | Int24 => {
            let v = r.read_u32_le()?;
            if unsigned {
                BinaryValue::Unsigned(v as u64)
            } else {
                BinaryValue::Signed(v as i32 as i64)
            }
        }
        LongLong => {
            let v = r.read_u64_le()?;
            if unsigned {
                BinaryValue::Unsigned(v)
            } else {
                BinaryValue::Signed(v as i64)
            }
        }
        Float => BinaryValue::Float(r.read_f32_le()?),
        Double => BinaryValue::Double(r.read_f64_le()?),
        Date | DateTime | Timestamp | Timestamp2 | DateTime2 => read_datetime(r, ty)?,
        Time | Time2 => read_time(r)?,
        Null => BinaryValue::Null,
        _ => {
            let bytes = r
                .read_lenenc_str()?
                .ok_or_else(|| crate::error::Error::protocol("unexpected NULL in non-nullable value slot"))?;
            BinaryValue::Bytes(bytes)
        }
    })
}

fn read_datetime(r: &mut Reader, ty: ColumnType) -> CResult<BinaryValue> {
    let len = r.read_u8()?;
    let (year, month, day, hour, minute, second, microsecond) = match len {
        0 => (0, 0, 0, 0, 0, 0, 0),
        4 => {
            let year = r.read_u16_le()?;
            let month = r.read_u8()?;
            let day = r.read_u8()?;
            (year, month, day, 0, 0, 0, 0)
        }
        7 => {
            let year = r.read_u16_le()?;
            let month = r.read_u8()?;
            let day = r.read_u8()?;
            let hour = r.read_u8()?;
            let minute = r.read_u8()?;
            let second = r.read_u8()?;
            (year, month, day, hour, minute, second, 0)
        }
        11 => {
            let year = r.read_u16_le()?;
            let month = r.read_u8()?;
            let day = r.read_u8()?;
            let hour = r.read_u8()?;
            let minute = r.read_u8()?;
            let second = r.read_u8()?;
            let microsecond = r.read_u32_le()?;
            (year, month, day, hour, minute, second, microsecond)
        }
        other => return Err(crate::error::Error::protocol(format!("bad datetime length {other}"))),
    };

    if ty == ColumnType::Date {
        Ok(BinaryValue::Date { year, month, day })
    } else {
        Ok(BinaryValue::DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
        })
    }
}

fn read_time(r: &mut Reader) -> CResult<BinaryValue> {
    let len = r.read_u8()?;
    if len == 0 {
        return Ok(BinaryValue::Time {
            is_negative: false,
            days: 0,
            hour: 0,
            minute: 0,
            second: 0,
            microsecond: 0,
        });
    }
    let is_negative = r.read_u8()? != 0;
    let days = r.read_u32_le()?;
    let hour = r.read_u8()?;
    let minute = r.read_u8()?;
    let second = r.read_u8()?;
    let microsecond = if len >= 12 { r.read_u32_le()? } else { 0 };
    Ok(BinaryValue::Time {
        is_negative,
        days,
        hour,
        minute,
        second,
        microsecond,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_len_matches_protocol_offset() {
        assert_eq!(null_bitmap_len(1), 1);
        assert_eq!(null_bitmap_len(7), 2);
        assert_eq!(null_bitmap_len(8), 2);
    }

    #[test]
    fn datetime_display_omits_fractional_seconds_when_zero() {
        let v = BinaryValue::DateTime {
            year: 2007,
            month: 11,
            day: 30,
            hour: 16,
            minute: 30,
            second: 19,
            microsecond: 0,
        };
        assert_eq!(v.to_string(), "2007-11-30 16:30:19");
    }

    #[test]
    fn datetime_display_includes_fractional_seconds_when_nonzero() {
        let v = BinaryValue::DateTime {
            year: 2007,
            month: 11,
            day: 30,
            hour: 16,
            minute: 30,
            second: 19,
            microsecond: 500,
        };
        assert_eq!(v.to_string(), "2007-11-30 16:30:19.000500");
    }

    #[test]
    fn unsigned_display_is_plain_decimal() {
        assert_eq!(BinaryValue::Unsigned(123456).to_string(), "123456");
    }

    #[test]
    fn datetime_zero_length_is_zero_value() {
        let buf = [0u8];
        let mut r = Reader::new(&buf);
        let v = read_datetime(&mut r, ColumnType::DateTime).unwrap();
        assert_eq!(
            v,
            BinaryValue::DateTime {
                year: 0,
                month: 0,
                day: 0,
                hour: 0,
                minute: 0,
                second: 0,
                microsecond: 0
            }
        );
    }
}
