//! COM_STMT_CLOSE (SPEC_FULL.md §4.5, §6): no response is sent.

use super::CommandType;
use crate::codec::write_u32_le;

pub fn serialize(statement_id: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.push(CommandType::StmtClose as u8);
    write_u32_le(&mut out, statement_id);
    out
}
