//! COM_STMT_PREPARE_OK response header (SPEC_FULL.md §4.5).

use crate::codec::Reader;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct StmtPrepareOk {
    pub statement_id: u32,
    pub num_columns: u16,
    pub num_params: u16,
    pub warnings: u16,
}

impl StmtPrepareOk {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0x00 header
        let statement_id = r.read_u32_le()?;
        let num_columns = r.read_u16_le()?;
        let num_params = r.read_u16_le()?;
        r.skip(1)?; // filler
        let warnings = if r.remaining() >= 2 { r.read_u16_le()? } else { 0 };
        Ok(StmtPrepareOk {
            statement_id,
            num_columns,
            num_params,
            warnings,
        })
    }
}
