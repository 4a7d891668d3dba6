//! COM_STMT_RESET (SPEC_FULL.md §4.5, §6): clears any data accumulated via
//! COM_STMT_SEND_LONG_DATA and resets the statement to its just-prepared
//! state. The server responds with an OK or ERR packet.

use super::CommandType;
use crate::codec::write_u32_le;

pub fn serialize(statement_id: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.push(CommandType::StmtReset as u8);
    write_u32_le(&mut out, statement_id);
    out
}
