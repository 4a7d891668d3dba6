//! ERR_Packet (SPEC_FULL.md §4.6, §7).

use crate::codec::Reader;
use crate::error::{Error, ErrorOrigin};

use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0xff header

        let error_code = r.read_u16_le()?;

        let sql_state = if r.peek_u8().unwrap_or(0) == b'#' {
            r.read_u8()?;
            String::from_utf8_lossy(r.read_bytes(5)?).into_owned()
        } else {
            "HY000".to_string()
        };

        let error_message = String::from_utf8_lossy(r.rest()).into_owned();

        Ok(ErrPacket {
            error_code,
            sql_state,
            error_message,
        })
    }

    pub fn into_error(self) -> Error {
        Error {
            code: self.error_code as u32,
            sqlstate: self.sql_state,
            message: self.error_message,
            origin: ErrorOrigin::Server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_access_denied() {
        let mut packet = vec![0xff];
        packet.extend_from_slice(&1045u16.to_le_bytes());
        packet.push(b'#');
        packet.extend_from_slice(b"28000");
        packet.extend_from_slice(b"Access denied for user 'root'@'localhost'");

        let err = ErrPacket::parse(&packet).unwrap();
        assert_eq!(err.error_code, 1045);
        assert_eq!(err.sql_state, "28000");
        assert!(err.error_message.contains("Access denied"));

        let e = err.into_error();
        assert_eq!(e.origin, ErrorOrigin::Server);
    }
}
