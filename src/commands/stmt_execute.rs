//! COM_STMT_EXECUTE (SPEC_FULL.md §4.5): NULL bitmap, `new_params_bound`
//! flag, parameter types and values.

use super::CommandType;
use crate::codec::write_u32_le;
use crate::stmt::param::ParamValue;

const CURSOR_TYPE_NO_CURSOR: u8 = 0x00;

/// `new_params_bound` mirrors `Statement::new_bind` (SPEC_FULL.md §3, §4.5):
/// when false, the server reuses the parameter types from the statement's
/// last execute and the type block is omitted entirely.
pub fn serialize(statement_id: u32, params: &[ParamValue], new_params_bound: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + params.len() * 8);
    out.push(CommandType::StmtExecute as u8);
    write_u32_le(&mut out, statement_id);
    out.push(CURSOR_TYPE_NO_CURSOR);
    write_u32_le(&mut out, 1); // iteration-count, always 1

    if params.is_empty() {
        return out;
    }

    let bitmap_len = (params.len() + 7) / 8;
    let mut bitmap = vec![0u8; bitmap_len];
    for (i, p) in params.iter().enumerate() {
        if p.is_null() {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    out.extend_from_slice(&bitmap);

    out.push(if new_params_bound { 1 } else { 0 });

    if new_params_bound {
        for p in params {
            let (ty, unsigned) = p.wire_type();
            out.push(ty as u8);
            out.push(if unsigned { 0x80 } else { 0x00 });
        }
    }

    for p in params {
        if !p.is_null() {
            p.encode_value(&mut out);
        }
    }

    out
}
