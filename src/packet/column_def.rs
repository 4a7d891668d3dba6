//! Column definition packet (`Protocol::ColumnDefinition41`), shared by
//! text and binary result sets (SPEC_FULL.md §4.5, §4.6).

use crate::codec::Reader;
use crate::declar::column_type::ColumnType;
use crate::error::CResult;

/// Bit in [`ColumnDefinition::flags`] marking an integer column as unsigned;
/// needed to decode binary-protocol integer values with the right sign.
pub const UNSIGNED_FLAG: u16 = 0x0020;

#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub character_set: u16,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: u16,
    pub decimals: u8,
}

impl ColumnDefinition {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);

        let catalog = lenenc_string(&mut r)?;
        let schema = lenenc_string(&mut r)?;
        let table = lenenc_string(&mut r)?;
        let org_table = lenenc_string(&mut r)?;
        let name = lenenc_string(&mut r)?;
        let org_name = lenenc_string(&mut r)?;

        r.read_lenenc_int()?; // length of fixed-length fields, always 0x0c
        let character_set = r.read_u16_le()?;
        let column_length = r.read_u32_le()?;
        let type_byte = r.read_u8()?;
        let column_type = ColumnType::try_from(type_byte)
            .map_err(|_| crate::error::Error::protocol(format!("unknown column type {type_byte}")))?;
        let flags = r.read_u16_le()?;
        let decimals = r.read_u8()?;

        Ok(ColumnDefinition {
            catalog,
            schema,
            table,
            org_table,
            name,
            org_name,
            character_set,
            column_length,
            column_type,
            flags,
            decimals,
        })
    }
}

fn lenenc_string(r: &mut Reader) -> CResult<String> {
    let bytes = r
        .read_lenenc_str()?
        .ok_or_else(|| crate::error::Error::protocol("unexpected NULL in column definition string"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{write_lenenc_int, write_lenenc_str, write_u16_le, write_u32_le};

    #[test]
    fn parses_column_definition() {
        let mut p = Vec::new();
        write_lenenc_str(&mut p, b"def");
        write_lenenc_str(&mut p, b"mydb");
        write_lenenc_str(&mut p, b"t");
        write_lenenc_str(&mut p, b"t");
        write_lenenc_str(&mut p, b"id");
        write_lenenc_str(&mut p, b"id");
        write_lenenc_int(&mut p, 0x0c);
        write_u16_le(&mut p, 33);
        write_u32_le(&mut p, 11);
        p.push(3); // LONG
        write_u16_le(&mut p, 0);
        p.push(0);

        let col = ColumnDefinition::parse(&p).unwrap();
        assert_eq!(col.name, "id");
        assert_eq!(col.column_type, ColumnType::Long);
    }
}
