//! Protocol constants and small value types shared across the crate.

pub mod auth_plugin;
pub mod capability_flags;
pub mod column_type;
pub mod status_flags;

pub use auth_plugin::AuthPlugin;
pub use capability_flags::CapabilityFlags;
pub use column_type::ColumnType;
pub use status_flags::StatusFlags;

/// First byte of a non-OK/EOF/ERR response packet body, used to dispatch
/// parsing of a generic command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Ok,
    Err,
    Eof,
    AuthSwitch,
    AuthMoreData,
    LocalInFile,
    Other(u8),
}

impl ResponseType {
    pub fn from_marker(byte: u8, payload_len: usize) -> Self {
        match byte {
            0x00 if payload_len >= 7 => ResponseType::Ok,
            0xff => ResponseType::Err,
            // An OK packet can also start with 0x00 for small payloads (e.g.
            // affected_rows=0); EOF's 0xfe marker only means EOF when the
            // payload is short, per CLIENT_DEPRECATE_EOF handling in callers.
            0xfe if payload_len < 9 => ResponseType::Eof,
            0xfe => ResponseType::AuthSwitch,
            0x01 => ResponseType::AuthMoreData,
            0xfb => ResponseType::LocalInFile,
            other => ResponseType::Other(other),
        }
    }
}
