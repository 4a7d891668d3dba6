//! Password hashing for `mysql_native_password` and `caching_sha2_password`
//! (SPEC_FULL.md §4.4).

use openssl::rsa::{Padding, Rsa};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::declar::auth_plugin::AuthPlugin;
use crate::error::{client_codes, CResult, Error};

pub fn xor(slice1: &[u8], slice2: &[u8]) -> Vec<u8> {
    slice1
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ slice2[i % slice2.len()])
        .collect()
}

fn sha1(value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(value);
    hasher.finalize().to_vec()
}

fn sha256(value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hasher.finalize().to_vec()
}

/// Computes the initial auth-response sent in the handshake response / auth
/// switch response, for either supported plugin. An empty password yields
/// an empty response, per protocol.
pub fn encrypt_password(password: &str, scramble: &[u8], plugin: AuthPlugin) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    match plugin {
        AuthPlugin::MysqlNativePassword => {
            let stage1 = sha1(password.as_bytes());
            let stage2 = sha1(&stage1);
            let concat = [scramble, &stage2].concat();
            xor(&stage1, &sha1(&concat))
        }
        AuthPlugin::CachingSha2Password => {
            let stage1 = sha256(password.as_bytes());
            let stage2 = sha256(&stage1);
            let concat = [scramble, &stage2].concat();
            xor(&stage1, &sha256(&concat))
        }
    }
}

/// RSA-OAEP-encrypts the NUL-terminated, scramble-XORed password using the
/// PEM public key the server sent during caching_sha2_password full auth.
pub fn rsa_encrypt_password(password: &str, scramble: &[u8], public_key_pem: &[u8]) -> CResult<Vec<u8>> {
    let mut padded = password.as_bytes().to_vec();
    padded.push(0);
    let xored = xor(&padded, scramble);

    let rsa = Rsa::public_key_from_pem(public_key_pem)?;
    let mut encrypted = vec![0u8; rsa.size() as usize];
    rsa.public_encrypt(&xored, &mut encrypted, Padding::PKCS1_OAEP)
        .map_err(|e| Error::client(client_codes::TLS_ERROR, format!("RSA public_encrypt failed: {e}")))?;
    Ok(encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_yields_empty_response() {
        assert!(encrypt_password("", b"12345678901234567890", AuthPlugin::MysqlNativePassword).is_empty());
        assert!(encrypt_password("", b"12345678901234567890", AuthPlugin::CachingSha2Password).is_empty());
    }

    #[test]
    fn native_password_response_is_20_bytes() {
        let resp = encrypt_password("secret", b"01234567890123456789", AuthPlugin::MysqlNativePassword);
        assert_eq!(resp.len(), 20);
    }

    #[test]
    fn sha2_password_response_is_32_bytes() {
        let resp = encrypt_password("secret", b"01234567890123456789", AuthPlugin::CachingSha2Password);
        assert_eq!(resp.len(), 32);
    }

    #[test]
    fn xor_wraps_shorter_key() {
        let data = [0xffu8; 4];
        let key = [0x0fu8];
        assert_eq!(xor(&data, &key), vec![0xf0, 0xf0, 0xf0, 0xf0]);
    }
}
