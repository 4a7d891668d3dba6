//! The session layer: connection options, the poll-driven state machine and
//! the result-set types it exposes (SPEC_FULL.md §3, §5, §6).

pub mod connection;
pub mod options;
pub mod result;
pub mod state;

pub use connection::{Connection, PreparedStatementInfo, SessionInfo};
pub use options::{ConnectionOptions, Protocol, SslMode, SslOpts};
pub use result::{BinaryRow, ResultSetMeta, TextRow};
pub use state::PollEvent;
