//! Parsers for the individual packet shapes the core sends and receives.

pub mod auth_switch;
pub mod column_def;
pub mod eof;
pub mod err;
pub mod handshake;
pub mod ok;
pub mod prepare_ok;
pub mod row_binary;
pub mod row_text;

use crate::declar::ResponseType;
use crate::error::CResult;

/// Returns an error built from the packet's ERR_Packet body if `packet`
/// is one, otherwise `Ok(())`.
pub fn check_error(packet: &[u8]) -> CResult<()> {
    if packet.first() == Some(&0xff) {
        return Err(err::ErrPacket::parse(packet)?.into_error());
    }
    Ok(())
}

pub fn classify(packet: &[u8]) -> ResponseType {
    ResponseType::from_marker(*packet.first().unwrap_or(&0), packet.len())
}
