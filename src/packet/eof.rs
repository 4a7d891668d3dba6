//! EOF_Packet (SPEC_FULL.md §4.6). The 0xfe marker is ambiguous with a
//! length-encoded integer lead byte; `is_eof` applies the same
//! length-under-9 disambiguation the wire protocol relies on.

use crate::codec::Reader;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct EofPacket {
    pub warning_count: u16,
    pub status_flags: u16,
}

impl EofPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0xfe header
        let warning_count = r.read_u16_le()?;
        let status_flags = r.read_u16_le()?;
        Ok(EofPacket {
            warning_count,
            status_flags,
        })
    }

    pub fn is_eof(packet: &[u8]) -> bool {
        !packet.is_empty() && packet[0] == 0xfe && packet.len() < 9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_eof_marker() {
        let packet = [0xfe, 0x00, 0x00, 0x02, 0x00];
        assert!(EofPacket::is_eof(&packet));
        let eof = EofPacket::parse(&packet).unwrap();
        assert_eq!(eof.warning_count, 0);
    }

    #[test]
    fn long_packet_with_fe_marker_is_not_eof() {
        let packet = vec![0xfe; 20];
        assert!(!EofPacket::is_eof(&packet));
    }
}
