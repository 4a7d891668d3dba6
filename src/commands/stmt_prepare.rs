//! COM_STMT_PREPARE (SPEC_FULL.md §4.5).

use super::CommandType;

pub fn serialize(sql: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + sql.len());
    out.push(CommandType::StmtPrepare as u8);
    out.extend_from_slice(sql.as_bytes());
    out
}
