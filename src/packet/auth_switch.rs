//! AuthSwitchRequest and caching_sha2_password's AuthMoreData
//! (SPEC_FULL.md §4.4).

use crate::codec::Reader;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct AuthSwitchRequestPacket {
    pub auth_plugin_name: String,
    pub auth_plugin_data: Vec<u8>,
}

impl AuthSwitchRequestPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0xfe header
        let auth_plugin_name = r.read_null_term_string()?;
        // Trailing NUL on the data is optional depending on server version.
        let mut data = r.rest().to_vec();
        if data.last() == Some(&0) {
            data.pop();
        }
        Ok(AuthSwitchRequestPacket {
            auth_plugin_name,
            auth_plugin_data: data,
        })
    }
}

/// Body of an AuthMoreData packet (header 0x01 followed by one status byte
/// for caching_sha2_password, or the RSA public key PEM during full auth).
#[derive(Debug, Clone)]
pub struct AuthMoreDataPacket {
    pub data: Vec<u8>,
}

impl AuthMoreDataPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut r = Reader::new(packet);
        r.read_u8()?; // 0x01 header
        Ok(AuthMoreDataPacket {
            data: r.rest().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_null_term_string;

    #[test]
    fn parses_auth_switch_request() {
        let mut packet = vec![0xfe];
        write_null_term_string(&mut packet, "caching_sha2_password");
        packet.extend_from_slice(b"0123456789012345678\0");

        let asr = AuthSwitchRequestPacket::parse(&packet).unwrap();
        assert_eq!(asr.auth_plugin_name, "caching_sha2_password");
        assert_eq!(asr.auth_plugin_data.len(), 19);
    }

    #[test]
    fn parses_auth_more_data_fast_auth_success() {
        let packet = [0x01, 0x03];
        let amd = AuthMoreDataPacket::parse(&packet).unwrap();
        assert_eq!(amd.data, vec![0x03]);
    }
}
