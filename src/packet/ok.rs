//! OK_Packet (SPEC_FULL.md §4.6). Also doubles as an EOF replacement when
//! CLIENT_DEPRECATE_EOF is negotiated -- this core never negotiates that
//! flag (see SPEC_FULL.md §9), but parsing accepts either header byte so a
//! future server that forces it does not desync the framer.

use crate::codec::Reader;
use crate::declar::status_flags::StatusFlags;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: StatusFlags,
    pub warnings: u16,
    pub info: String,
}

impl OkPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0x00 or 0xfe header

        let affected_rows = r.read_lenenc_int()?.unwrap_or(0);
        let last_insert_id = r.read_lenenc_int()?.unwrap_or(0);

        let status_flags = if r.remaining() >= 2 { r.read_u16_le()? } else { 0 };
        let warnings = if r.remaining() >= 2 { r.read_u16_le()? } else { 0 };

        let info = if r.remaining() > 0 {
            String::from_utf8_lossy(r.rest()).into_owned()
        } else {
            String::new()
        };

        Ok(OkPacket {
            affected_rows,
            last_insert_id,
            status_flags: StatusFlags::new(status_flags),
            warnings,
            info,
        })
    }
}
