//! COM_STMT_SEND_LONG_DATA (SPEC_FULL.md §4.5, §6): streams a large
//! parameter value in chunks ahead of COM_STMT_EXECUTE. The server never
//! replies to this command, successfully or otherwise.

use super::CommandType;
use crate::codec::{write_u16_le, write_u32_le};

pub fn serialize(statement_id: u32, param_index: u16, chunk: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(7 + chunk.len());
    out.push(CommandType::StmtSendLongData as u8);
    write_u32_le(&mut out, statement_id);
    write_u16_le(&mut out, param_index);
    out.extend_from_slice(chunk);
    out
}
