//! The session state machine's phases (SPEC_FULL.md §5): every suspension
//! point the core can resume from is represented as a variant here rather
//! than as implicit call-stack state, so [`crate::conn::connection::Connection::poll`]
//! can return control to the caller and pick up again on the next call.

use std::sync::Arc;

use crate::declar::auth_plugin::AuthPlugin;
use crate::packet::column_def::ColumnDefinition;
use crate::packet::prepare_ok::StmtPrepareOk;

/// Outcome of a single [`crate::conn::connection::Connection::poll`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// No progress was possible (nothing to read, nothing queued to write).
    None,
    /// Connected and idle, ready to accept a new command.
    Idle,
    /// A command is in flight; more I/O is needed before it completes.
    Processing,
    /// A row has been decoded and can be read off the connection/statement.
    RowReady,
    /// The in-flight command has finished; the connection returns to Idle.
    Eof,
}

#[derive(Debug)]
pub enum AuthStep {
    AwaitHandshakeResponseResult,
    AwaitAuthSwitchResult { plugin: AuthPlugin },
    AwaitSha2PublicKey,
    AwaitSha2FullAuthResult,
}

#[derive(Debug, Clone)]
pub enum PreparedResult {
    PendingParams {
        ok: StmtPrepareOk,
        remaining_params: u16,
        params: Vec<ColumnDefinition>,
    },
    PendingParamsEof {
        ok: StmtPrepareOk,
        params: Vec<ColumnDefinition>,
    },
    PendingColumns {
        ok: StmtPrepareOk,
        params: Vec<ColumnDefinition>,
        remaining_columns: u16,
        columns: Vec<ColumnDefinition>,
    },
    PendingColumnsEof {
        ok: StmtPrepareOk,
        params: Vec<ColumnDefinition>,
        columns: Vec<ColumnDefinition>,
    },
}

/// What kind of command the connection is currently driving to completion.
#[derive(Debug)]
pub enum CommandPhase {
    AwaitQueryResponse,
    AwaitColumns {
        remaining: u16,
        columns: Vec<ColumnDefinition>,
    },
    AwaitColumnsEof {
        columns: Vec<ColumnDefinition>,
    },
    AwaitTextRow {
        columns: Arc<Vec<ColumnDefinition>>,
    },
    AwaitPrepareResponse,
    AwaitPrepare(PreparedResult),
    AwaitExecuteResponse,
    AwaitExecuteColumns {
        remaining: u16,
        columns: Vec<ColumnDefinition>,
    },
    AwaitExecuteColumnsEof {
        columns: Vec<ColumnDefinition>,
    },
    AwaitBinaryRow {
        columns: Arc<Vec<ColumnDefinition>>,
        unsigned_flags: Arc<Vec<bool>>,
    },
    AwaitPingResponse,
    AwaitResetResponse,
}

#[derive(Debug)]
pub enum Phase {
    NotConnected,
    WaitHandshake,
    WaitSslHandshakeThenAuth,
    Authenticating(AuthStep),
    Idle,
    InCommand(CommandPhase),
    Closed,
}
