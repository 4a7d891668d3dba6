//! COM_PING (SPEC_FULL.md §6).

use super::CommandType;

pub fn serialize() -> Vec<u8> {
    vec![CommandType::Ping as u8]
}
