//! COM_QUIT: no response is expected (SPEC_FULL.md §6).

use super::CommandType;

pub fn serialize() -> Vec<u8> {
    vec![CommandType::Quit as u8]
}
