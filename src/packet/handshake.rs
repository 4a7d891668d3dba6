//! Initial Handshake V10 packet sent by the server on connect
//! (SPEC_FULL.md §4.1).

use crate::codec::Reader;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    pub auth_plugin_data: Vec<u8>,
    pub capability_flags: u32,
    pub character_set: u8,
    pub status_flags: u16,
    pub auth_plugin_name: Option<String>,
}

impl HandshakePacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);

        let protocol_version = r.read_u8()?;
        let server_version = r.read_null_term_string()?;
        let connection_id = r.read_u32_le()?;

        let mut auth_plugin_data = r.read_bytes(8)?.to_vec();
        r.skip(1)?; // filler

        let capability_lower = r.read_u16_le()? as u32;
        let character_set = r.read_u8()?;
        let status_flags = r.read_u16_le()?;
        let capability_upper = r.read_u16_le()? as u32;
        let capability_flags = capability_lower | (capability_upper << 16);

        let auth_data_len = r.read_u8()?;
        r.skip(10)?; // reserved

        let has_secure_conn = capability_flags & crate::declar::capability_flags::CLIENT_SECURE_CONNECTION != 0;
        let has_plugin_auth = capability_flags & crate::declar::capability_flags::CLIENT_PLUGIN_AUTH != 0;

        let auth_plugin_name = if has_plugin_auth || has_secure_conn {
            let part2_len = if auth_data_len > 8 {
                (auth_data_len as usize - 8).max(13)
            } else {
                13
            };
            let part2 = r.read_bytes(part2_len)?;
            // part2 is NUL-padded; trim trailing NULs before appending.
            let trimmed_end = part2.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
            auth_plugin_data.extend_from_slice(&part2[..trimmed_end]);

            if has_plugin_auth {
                Some(r.read_null_term_string().unwrap_or_default())
            } else {
                None
            }
        } else {
            None
        };

        Ok(HandshakePacket {
            protocol_version,
            server_version,
            connection_id,
            auth_plugin_data,
            capability_flags,
            character_set,
            status_flags,
            auth_plugin_name,
        })
    }
}
