//! HandshakeResponse41: the client's reply to the initial handshake,
//! carrying the negotiated capability flags, username and auth response
//! (SPEC_FULL.md §4.4).

use crate::auth::encrypt_password;
use crate::codec::{write_lenenc_str, write_null_term_string, write_u32_le};
use crate::declar::auth_plugin::AuthPlugin;

pub struct HandshakeResponseCommand<'a> {
    pub client_capabilities: u32,
    pub client_collation: u8,
    pub username: &'a str,
    pub password: &'a str,
    pub database: Option<&'a str>,
    pub scramble: &'a [u8],
    pub auth_plugin: AuthPlugin,
}

impl<'a> HandshakeResponseCommand<'a> {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.username.len());
        write_u32_le(&mut out, self.client_capabilities);
        write_u32_le(&mut out, 0); // max_packet_size
        out.push(self.client_collation);
        out.extend_from_slice(&[0u8; 23]);

        write_null_term_string(&mut out, self.username);

        let auth_response = encrypt_password(self.password, self.scramble, self.auth_plugin);
        // CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA is always requested, so the
        // response is framed as a length-encoded string rather than the
        // legacy 1-byte-length form.
        write_lenenc_str(&mut out, &auth_response);

        if let Some(db) = self.database {
            write_null_term_string(&mut out, db);
        }

        write_null_term_string(&mut out, self.auth_plugin.name());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_username_and_plugin_name() {
        let cmd = HandshakeResponseCommand {
            client_capabilities: 0,
            client_collation: 33,
            username: "root",
            password: "",
            database: None,
            scramble: b"01234567890123456789",
            auth_plugin: AuthPlugin::MysqlNativePassword,
        };
        let bytes = cmd.serialize();
        let as_str = String::from_utf8_lossy(&bytes);
        assert!(as_str.contains("root"));
        assert!(as_str.contains("mysql_native_password"));
    }
}
