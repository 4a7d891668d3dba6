//! SSLRequest packet: the truncated handshake response sent before the TLS
//! handshake begins (SPEC_FULL.md §4.3).

use crate::codec::write_u32_le;

pub struct SslRequestCommand {
    pub client_capabilities: u32,
    pub max_packet_size: u32,
    pub client_collation: u8,
}

impl SslRequestCommand {
    pub fn new(client_capabilities: u32, client_collation: u8) -> Self {
        SslRequestCommand {
            client_capabilities,
            max_packet_size: 0,
            client_collation,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        write_u32_le(&mut out, self.client_capabilities);
        write_u32_le(&mut out, self.max_packet_size);
        out.push(self.client_collation);
        out.extend_from_slice(&[0u8; 23]);
        out
    }
}
