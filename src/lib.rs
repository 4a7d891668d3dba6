pub mod auth;
pub mod codec;
pub mod commands;
pub mod conn;
pub mod declar;
pub mod error;
pub mod framer;
pub mod packet;
pub mod stmt;
pub mod transport;

pub use conn::{Connection, ConnectionOptions, PollEvent, Protocol, SslMode, SslOpts};
pub use error::{CResult, Error};
pub use stmt::{ParamValue, Statement};

/// Packet framing constants (SPEC_FULL.md §4.1).
pub const PACKET_HEADER_SIZE: usize = 4;
pub const MAX_BODY_LENGTH: usize = 0x00ff_ffff;
pub const NULL_TERMINATOR: u8 = 0;
pub const UTF8_MB4_GENERAL_CI: u8 = 45;
