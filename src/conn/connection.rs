//! The session state machine (SPEC_FULL.md §5, §6): a single [`Connection`]
//! owns one [`crate::transport::Transport`] plus the framing/decompression
//! layered on top of it, and is driven exclusively through [`Connection::poll`].
//! Nothing here blocks; every suspension point is a [`Phase`] variant that
//! [`Connection::poll`] resumes from on the next call.
//!
//! Grounded in the teacher's `conn/connection.rs` `do_handshake` /
//! `authenticate_sha_256` / `handle_auth_plugin_switch` flow, reworked from a
//! blocking `read_packet`/`write_packet` call chain into explicit states.

use std::mem;
use std::sync::Arc;

use crate::auth::{encrypt_password, rsa_encrypt_password};
use crate::codec::Reader;
use crate::commands::handshake_response::HandshakeResponseCommand;
use crate::commands::ssl_request::SslRequestCommand;
use crate::commands::text_query::QueryCommand;
use crate::commands::{ping, quit, stmt_close, stmt_execute, stmt_long_data, stmt_prepare, stmt_reset};
use crate::conn::options::{ConnectionOptions, Protocol, SslMode};
use crate::conn::result::{BinaryRow, ResultSetMeta, TextRow};
use crate::conn::state::{AuthStep, CommandPhase, Phase, PollEvent, PreparedResult};
use crate::declar::auth_plugin::{AuthPlugin, Sha2FastAuthResult};
use crate::declar::capability_flags::{self, CapabilityFlags};
use crate::declar::status_flags::StatusFlags;
use crate::declar::ResponseType;
use crate::error::{client_codes, CResult, Error};
use crate::framer::{encode_packets, CompressedReader, CompressedWriter, PacketFramer};
use crate::packet::auth_switch::{AuthMoreDataPacket, AuthSwitchRequestPacket};
use crate::packet::column_def::{ColumnDefinition, UNSIGNED_FLAG};
use crate::packet::eof::EofPacket;
use crate::packet::err::ErrPacket;
use crate::packet::handshake::HandshakePacket;
use crate::packet::ok::OkPacket;
use crate::packet::prepare_ok::StmtPrepareOk;
use crate::stmt::param::ParamValue;
use crate::transport::{IoOutcome, Transport};

const READ_BUF_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub struct SessionInfo {
    pub capability_flags: CapabilityFlags,
    pub status_flags: StatusFlags,
    pub connection_id: u32,
    pub server_version: String,
    pub character_set: u8,
    pub auth_plugin: AuthPlugin,
    pub scramble: Vec<u8>,
}

impl Default for SessionInfo {
    fn default() -> Self {
        SessionInfo {
            capability_flags: CapabilityFlags::default(),
            status_flags: StatusFlags::default(),
            connection_id: 0,
            server_version: String::new(),
            character_set: 0,
            auth_plugin: AuthPlugin::MysqlNativePassword,
            scramble: Vec::new(),
        }
    }
}

/// Everything learned once a COM_STMT_PREPARE exchange completes, cached so
/// a [`crate::stmt::statement::Statement`] can bind and execute it later.
#[derive(Debug, Clone)]
pub struct PreparedStatementInfo {
    pub statement_id: u32,
    pub param_count: u16,
    pub params: Arc<Vec<ColumnDefinition>>,
    pub columns: Arc<Vec<ColumnDefinition>>,
}

pub struct Connection {
    transport: Transport,
    framer: PacketFramer,
    compressed_reader: Option<CompressedReader>,
    compressed_writer: Option<CompressedWriter>,
    options: ConnectionOptions,
    phase: Phase,
    pending_write: Vec<u8>,
    session: SessionInfo,

    current_text_row: Option<TextRow>,
    current_binary_row: Option<BinaryRow>,
    current_result: Option<ResultSetMeta>,
    last_ok: Option<OkPacket>,
    prepared: Option<PreparedStatementInfo>,
}

impl Connection {
    /// Opens the transport and begins the handshake. The handshake itself
    /// is driven by subsequent [`Connection::poll`] calls, not by this
    /// constructor -- nothing here blocks beyond the one unavoidable
    /// blocking DNS-resolve-and-connect call in [`crate::transport::tcp`].
    pub fn connect(options: ConnectionOptions) -> CResult<Self> {
        let transport = match options.resolved_protocol() {
            Protocol::Uds => {
                let path = options.uds_path.as_deref().ok_or_else(|| {
                    Error::client(client_codes::CONNECTION_ERROR, "uds protocol selected with no uds_path set")
                })?;
                Transport::connect_uds(path)?
            }
            _ => Transport::connect_tcp(&options.hostname, options.port)?,
        };

        Ok(Connection {
            transport,
            framer: PacketFramer::new(),
            compressed_reader: None,
            compressed_writer: None,
            options,
            phase: Phase::WaitHandshake,
            pending_write: Vec::new(),
            session: SessionInfo::default(),
            current_text_row: None,
            current_binary_row: None,
            current_result: None,
            last_ok: None,
            prepared: None,
        })
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn current_row(&self) -> Option<&TextRow> {
        self.current_text_row.as_ref()
    }

    pub fn current_binary_row(&self) -> Option<&BinaryRow> {
        self.current_binary_row.as_ref()
    }

    pub fn current_result(&self) -> Option<&ResultSetMeta> {
        self.current_result.as_ref()
    }

    pub fn last_ok(&self) -> Option<&OkPacket> {
        self.last_ok.as_ref()
    }

    pub fn take_prepared(&mut self) -> Option<PreparedStatementInfo> {
        self.prepared.take()
    }

    // ---- Outbound commands ----------------------------------------------

    pub fn query(&mut self, sql: &str) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&QueryCommand::new(sql).serialize(), true)?;
        self.phase = Phase::InCommand(CommandPhase::AwaitQueryResponse);
        Ok(())
    }

    pub fn prepare(&mut self, sql: &str) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&stmt_prepare::serialize(sql), true)?;
        self.phase = Phase::InCommand(CommandPhase::AwaitPrepareResponse);
        Ok(())
    }

    pub fn execute_statement(
        &mut self,
        statement_id: u32,
        params: &[ParamValue],
        new_params_bound: bool,
    ) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(
            &stmt_execute::serialize(statement_id, params, new_params_bound),
            true,
        )?;
        self.phase = Phase::InCommand(CommandPhase::AwaitExecuteResponse);
        Ok(())
    }

    pub fn ping(&mut self) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&ping::serialize(), true)?;
        self.phase = Phase::InCommand(CommandPhase::AwaitPingResponse);
        Ok(())
    }

    pub fn reset_statement(&mut self, statement_id: u32) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&stmt_reset::serialize(statement_id), true)?;
        self.phase = Phase::InCommand(CommandPhase::AwaitResetResponse);
        Ok(())
    }

    /// COM_STMT_CLOSE and COM_STMT_SEND_LONG_DATA draw no response, so the
    /// connection stays `Idle`.
    pub fn close_statement(&mut self, statement_id: u32) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&stmt_close::serialize(statement_id), true)
    }

    pub fn send_long_data(&mut self, statement_id: u32, param_index: u16, chunk: &[u8]) -> CResult<()> {
        self.require_idle()?;
        self.send_payload(&stmt_long_data::serialize(statement_id, param_index, chunk), true)
    }

    pub fn close(&mut self) -> CResult<()> {
        self.send_payload(&quit::serialize(), true)?;
        self.flush_pending_write()?;
        self.phase = Phase::Closed;
        Ok(())
    }

    fn require_idle(&self) -> CResult<()> {
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Closed => Err(Error::not_connected()),
            _ => Err(Error::client(client_codes::UNKNOWN, "a command is already in flight")),
        }
    }

    // ---- Driving I/O -------------------------------------------------------

    pub fn poll(&mut self) -> CResult<PollEvent> {
        if self.transport.is_handshaking() {
            let done = self.transport.drive_handshake()?;
            if done && matches!(self.phase, Phase::WaitSslHandshakeThenAuth) {
                self.send_handshake_response()?;
                self.flush_pending_write()?;
                self.phase = Phase::Authenticating(AuthStep::AwaitHandshakeResponseResult);
            }
            return Ok(PollEvent::Processing);
        }

        self.flush_pending_write()?;

        let mut buf = [0u8; READ_BUF_SIZE];
        match self.transport.try_read(&mut buf)? {
            IoOutcome::WouldBlock => {}
            IoOutcome::Ready(0) => {
                self.phase = Phase::Closed;
                return Err(Error::client(client_codes::CONNECTION_ERROR, "server closed the connection"));
            }
            IoOutcome::Ready(n) => {
                if let Some(creader) = self.compressed_reader.as_mut() {
                    creader.feed(&buf[..n]);
                    while let Some(plain) = creader.take_plain()? {
                        self.framer.feed(&plain);
                    }
                } else {
                    self.framer.feed(&buf[..n]);
                }
            }
        }

        while let Some(packet) = self.framer.take_packet()? {
            let event = self.handle_packet(packet)?;
            if event != PollEvent::None {
                return Ok(event);
            }
        }

        match self.phase {
            Phase::Idle => Ok(PollEvent::Idle),
            Phase::Closed => Ok(PollEvent::Eof),
            _ => Ok(PollEvent::None),
        }
    }

    fn send_payload(&mut self, payload: &[u8], reset_seq: bool) -> CResult<()> {
        if reset_seq {
            self.framer.seq = 0;
        }
        let mut seq = self.framer.seq;
        let framed = encode_packets(payload, &mut seq);
        self.framer.seq = seq;

        let wire = match self.compressed_writer.as_mut() {
            Some(cw) => cw.wrap(&framed)?,
            None => framed,
        };
        self.pending_write.extend_from_slice(&wire);
        Ok(())
    }

    fn flush_pending_write(&mut self) -> CResult<()> {
        while !self.pending_write.is_empty() {
            match self.transport.try_write(&self.pending_write)? {
                IoOutcome::WouldBlock | IoOutcome::Ready(0) => break,
                IoOutcome::Ready(n) => {
                    self.pending_write.drain(0..n);
                }
            }
        }
        Ok(())
    }

    // ---- Packet dispatch ----------------------------------------------

    fn handle_packet(&mut self, packet: Vec<u8>) -> CResult<PollEvent> {
        let phase = mem::replace(&mut self.phase, Phase::Closed);
        match phase {
            Phase::WaitHandshake => self.handle_handshake_packet(&packet),
            Phase::Authenticating(step) => self.handle_auth_packet(step, &packet),
            Phase::InCommand(cmd_phase) => self.handle_command_packet(cmd_phase, &packet),
            other => {
                self.phase = other;
                Err(Error::protocol("received a packet while not expecting one"))
            }
        }
    }

    fn handle_handshake_packet(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        crate::packet::check_error(packet)?;
        let handshake = HandshakePacket::parse(packet)?;

        if handshake.protocol_version != 10 {
            return Err(Error::protocol(format!(
                "unsupported protocol version {}",
                handshake.protocol_version
            )));
        }
        if handshake.capability_flags & capability_flags::CLIENT_PROTOCOL_41 == 0 {
            return Err(Error::protocol("server does not support protocol 4.1"));
        }

        let mut wanted = capability_flags::DEFAULT_CLIENT_FLAGS;
        if self.options.database.is_some() {
            wanted |= capability_flags::CLIENT_CONNECT_WITH_DB;
        }
        if self.options.compress {
            wanted |= capability_flags::CLIENT_COMPRESS;
        }
        if self.options.ssl_mode == SslMode::Required {
            wanted |= capability_flags::CLIENT_SSL;
        }
        let negotiated = wanted & handshake.capability_flags;

        self.session.capability_flags = CapabilityFlags::new(negotiated);
        self.session.status_flags = StatusFlags::new(handshake.status_flags);
        self.session.connection_id = handshake.connection_id;
        self.session.character_set = handshake.character_set;
        self.session.server_version = handshake.server_version.clone();
        self.session.scramble = handshake.auth_plugin_data.clone();
        self.session.auth_plugin = handshake
            .auth_plugin_name
            .as_deref()
            .and_then(AuthPlugin::from_name)
            .unwrap_or(AuthPlugin::MysqlNativePassword);

        if self.options.ssl_mode == SslMode::Required {
            if handshake.capability_flags & capability_flags::CLIENT_SSL == 0 {
                return Err(Error::client(client_codes::TLS_ERROR, "server does not support TLS"));
            }
            self.begin_ssl_handshake()?;
            Ok(PollEvent::Processing)
        } else {
            self.send_handshake_response()?;
            self.phase = Phase::Authenticating(AuthStep::AwaitHandshakeResponseResult);
            Ok(PollEvent::Processing)
        }
    }

    fn begin_ssl_handshake(&mut self) -> CResult<()> {
        let ssl_req = SslRequestCommand::new(
            self.session.capability_flags.bits(),
            crate::UTF8_MB4_GENERAL_CI,
        );
        self.send_payload(&ssl_req.serialize(), false)?;
        self.flush_pending_write()?;
        if !self.pending_write.is_empty() {
            return Err(Error::client(
                client_codes::TLS_ERROR,
                "SSLRequest packet did not send in one non-blocking write",
            ));
        }
        self.transport
            .start_tls(&self.options.hostname, self.options.ssl_mode, &self.options)?;
        self.phase = Phase::WaitSslHandshakeThenAuth;
        Ok(())
    }

    fn send_handshake_response(&mut self) -> CResult<()> {
        let cmd = HandshakeResponseCommand {
            client_capabilities: self.session.capability_flags.bits(),
            client_collation: crate::UTF8_MB4_GENERAL_CI,
            username: &self.options.username,
            password: &self.options.password,
            database: self.options.database.as_deref(),
            scramble: &self.session.scramble,
            auth_plugin: self.session.auth_plugin,
        };
        self.send_payload(&cmd.serialize(), false)
    }

    fn handle_auth_packet(&mut self, step: AuthStep, packet: &[u8]) -> CResult<PollEvent> {
        match step {
            AuthStep::AwaitHandshakeResponseResult => self.handle_auth_result(packet, None),
            AuthStep::AwaitAuthSwitchResult { plugin } => self.handle_auth_result(packet, Some(plugin)),
            AuthStep::AwaitSha2PublicKey => self.handle_sha2_public_key(packet),
            AuthStep::AwaitSha2FullAuthResult => self.handle_final_ok_or_err(packet),
        }
    }

    /// Dispatches the packet following a HandshakeResponse41 or an
    /// AuthSwitchResponse: OK (done), ERR, AuthSwitchRequest, or
    /// AuthMoreData (fast-auth status byte for caching_sha2_password).
    fn handle_auth_result(&mut self, packet: &[u8], switched_plugin: Option<AuthPlugin>) -> CResult<PollEvent> {
        match packet.first() {
            Some(0x00) => self.finalize_auth(),
            Some(0xff) => Err(ErrPacket::parse(packet)?.into_error()),
            Some(0xfe) => {
                let asr = AuthSwitchRequestPacket::parse(packet)?;
                let plugin = AuthPlugin::from_name(&asr.auth_plugin_name).ok_or_else(|| {
                    Error::client(
                        client_codes::AUTH_PLUGIN_ERROR,
                        format!("unsupported auth plugin: {}", asr.auth_plugin_name),
                    )
                })?;
                self.session.auth_plugin = plugin;
                self.session.scramble = asr.auth_plugin_data.clone();
                let response = encrypt_password(&self.options.password, &asr.auth_plugin_data, plugin);
                self.send_payload(&response, false)?;
                self.phase = Phase::Authenticating(AuthStep::AwaitAuthSwitchResult { plugin });
                Ok(PollEvent::Processing)
            }
            Some(0x01) => {
                let plugin = switched_plugin.unwrap_or(self.session.auth_plugin);
                self.handle_sha2_fast_auth_result(packet, plugin)
            }
            _ => Err(Error::protocol("unexpected packet during authentication")),
        }
    }

    fn handle_sha2_fast_auth_result(&mut self, packet: &[u8], plugin: AuthPlugin) -> CResult<PollEvent> {
        if plugin != AuthPlugin::CachingSha2Password {
            return Err(Error::protocol("AuthMoreData received for a plugin that doesn't use it"));
        }
        let amd = AuthMoreDataPacket::parse(packet)?;
        let status = amd
            .data
            .first()
            .copied()
            .and_then(Sha2FastAuthResult::from_byte)
            .ok_or_else(|| Error::protocol("malformed caching_sha2_password status byte"))?;

        match status {
            Sha2FastAuthResult::Success => {
                self.phase = Phase::Authenticating(AuthStep::AwaitSha2FullAuthResult);
                Ok(PollEvent::Processing)
            }
            Sha2FastAuthResult::FullAuthRequired => {
                if self.transport.is_tls() {
                    let mut password = self.options.password.as_bytes().to_vec();
                    password.push(0);
                    self.send_payload(&password, false)?;
                    self.phase = Phase::Authenticating(AuthStep::AwaitSha2FullAuthResult);
                } else {
                    self.send_payload(&[0x02], false)?;
                    self.phase = Phase::Authenticating(AuthStep::AwaitSha2PublicKey);
                }
                Ok(PollEvent::Processing)
            }
        }
    }

    fn handle_sha2_public_key(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        crate::packet::check_error(packet)?;
        let amd = AuthMoreDataPacket::parse(packet)?;
        let response = rsa_encrypt_password(&self.options.password, &self.session.scramble, &amd.data)?;
        self.send_payload(&response, false)?;
        self.phase = Phase::Authenticating(AuthStep::AwaitSha2FullAuthResult);
        Ok(PollEvent::Processing)
    }

    fn handle_final_ok_or_err(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        match packet.first() {
            Some(0x00) => self.finalize_auth(),
            Some(0xff) => Err(ErrPacket::parse(packet)?.into_error()),
            _ => Err(Error::protocol("expected OK after authentication completed")),
        }
    }

    fn finalize_auth(&mut self) -> CResult<PollEvent> {
        if self.options.compress && self.session.capability_flags.contains(capability_flags::CLIENT_COMPRESS) {
            self.compressed_writer = Some(CompressedWriter::new());
            self.compressed_reader = Some(CompressedReader::new());
        }
        self.phase = Phase::Idle;
        Ok(PollEvent::Idle)
    }

    // ---- Command-result packet handling ---------------------------------

    fn handle_command_packet(&mut self, cmd_phase: CommandPhase, packet: &[u8]) -> CResult<PollEvent> {
        match cmd_phase {
            CommandPhase::AwaitQueryResponse => self.handle_query_response(packet),
            CommandPhase::AwaitColumns { remaining, columns } => self.handle_columns(remaining, columns, packet, false),
            CommandPhase::AwaitColumnsEof { columns } => self.handle_columns_eof(columns, packet, false),
            CommandPhase::AwaitTextRow { columns } => self.handle_text_row(columns, packet),
            CommandPhase::AwaitPrepareResponse => self.handle_prepare_response(packet),
            CommandPhase::AwaitPrepare(pr) => self.handle_prepare_state(pr, packet),
            CommandPhase::AwaitExecuteResponse => self.handle_query_response_as_execute(packet),
            CommandPhase::AwaitExecuteColumns { remaining, columns } => {
                self.handle_columns(remaining, columns, packet, true)
            }
            CommandPhase::AwaitExecuteColumnsEof { columns } => self.handle_columns_eof(columns, packet, true),
            CommandPhase::AwaitBinaryRow { columns, unsigned_flags } => {
                self.handle_binary_row(columns, unsigned_flags, packet)
            }
            CommandPhase::AwaitPingResponse => self.handle_simple_ok(packet),
            CommandPhase::AwaitResetResponse => self.handle_simple_ok(packet),
        }
    }

    fn handle_query_response(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        self.handle_result_header(packet, false)
    }

    fn handle_query_response_as_execute(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        self.handle_result_header(packet, true)
    }

    fn handle_result_header(&mut self, packet: &[u8], binary: bool) -> CResult<PollEvent> {
        match crate::packet::classify(packet) {
            ResponseType::Ok => {
                let ok = OkPacket::parse(packet)?;
                self.session.status_flags = ok.status_flags;
                let more = ok.status_flags.more_results_exist();
                self.last_ok = Some(ok);
                self.phase = if more {
                    Phase::InCommand(if binary {
                        CommandPhase::AwaitExecuteResponse
                    } else {
                        CommandPhase::AwaitQueryResponse
                    })
                } else {
                    Phase::Idle
                };
                Ok(PollEvent::Eof)
            }
            ResponseType::Err => {
                self.phase = Phase::Idle;
                Err(ErrPacket::parse(packet)?.into_error())
            }
            ResponseType::LocalInFile => {
                self.phase = Phase::Idle;
                Err(Error::protocol(
                    "server requested LOCAL INFILE, which this client does not support",
                ))
            }
            _ => {
                let mut r = Reader::new(packet);
                let count = r
                    .read_lenenc_int()?
                    .ok_or_else(|| Error::protocol("NULL column count in result set header"))?;
                if binary {
                    self.phase = Phase::InCommand(CommandPhase::AwaitExecuteColumns {
                        remaining: count as u16,
                        columns: Vec::new(),
                    });
                } else {
                    self.phase = Phase::InCommand(CommandPhase::AwaitColumns {
                        remaining: count as u16,
                        columns: Vec::new(),
                    });
                }
                Ok(PollEvent::Processing)
            }
        }
    }

    fn handle_columns(
        &mut self,
        remaining: u16,
        mut columns: Vec<ColumnDefinition>,
        packet: &[u8],
        binary: bool,
    ) -> CResult<PollEvent> {
        let col = ColumnDefinition::parse(packet)?;
        columns.push(col);
        let remaining = remaining - 1;
        self.phase = if remaining == 0 {
            if binary {
                Phase::InCommand(CommandPhase::AwaitExecuteColumnsEof { columns })
            } else {
                Phase::InCommand(CommandPhase::AwaitColumnsEof { columns })
            }
        } else if binary {
            Phase::InCommand(CommandPhase::AwaitExecuteColumns { remaining, columns })
        } else {
            Phase::InCommand(CommandPhase::AwaitColumns { remaining, columns })
        };
        Ok(PollEvent::Processing)
    }

    fn handle_columns_eof(&mut self, columns: Vec<ColumnDefinition>, packet: &[u8], binary: bool) -> CResult<PollEvent> {
        if !EofPacket::is_eof(packet) {
            return Err(Error::protocol("expected EOF after column definitions"));
        }
        let eof = EofPacket::parse(packet)?;
        self.session.status_flags = StatusFlags::new(eof.status_flags);

        let columns = Arc::new(columns);
        self.current_result = Some(ResultSetMeta { columns: columns.clone() });

        self.phase = if binary {
            let unsigned_flags = Arc::new(
                columns
                    .iter()
                    .map(|c| c.flags & UNSIGNED_FLAG != 0)
                    .collect::<Vec<_>>(),
            );
            Phase::InCommand(CommandPhase::AwaitBinaryRow { columns, unsigned_flags })
        } else {
            Phase::InCommand(CommandPhase::AwaitTextRow { columns })
        };
        Ok(PollEvent::Processing)
    }

    fn handle_text_row(&mut self, columns: Arc<Vec<ColumnDefinition>>, packet: &[u8]) -> CResult<PollEvent> {
        if EofPacket::is_eof(packet) {
            let eof = EofPacket::parse(packet)?;
            let status_flags = StatusFlags::new(eof.status_flags);
            self.session.status_flags = status_flags;
            self.phase = if status_flags.more_results_exist() {
                Phase::InCommand(CommandPhase::AwaitQueryResponse)
            } else {
                Phase::Idle
            };
            return Ok(PollEvent::Eof);
        }
        let row = TextRow::parse(packet, columns.len())?;
        self.current_text_row = Some(row);
        self.phase = Phase::InCommand(CommandPhase::AwaitTextRow { columns });
        Ok(PollEvent::RowReady)
    }

    fn handle_binary_row(
        &mut self,
        columns: Arc<Vec<ColumnDefinition>>,
        unsigned_flags: Arc<Vec<bool>>,
        packet: &[u8],
    ) -> CResult<PollEvent> {
        if EofPacket::is_eof(packet) {
            let eof = EofPacket::parse(packet)?;
            let status_flags = StatusFlags::new(eof.status_flags);
            self.session.status_flags = status_flags;
            self.phase = if status_flags.more_results_exist() {
                Phase::InCommand(CommandPhase::AwaitExecuteResponse)
            } else {
                Phase::Idle
            };
            return Ok(PollEvent::Eof);
        }
        let row = BinaryRow::parse(packet, &columns, &unsigned_flags)?;
        self.current_binary_row = Some(row);
        self.phase = Phase::InCommand(CommandPhase::AwaitBinaryRow { columns, unsigned_flags });
        Ok(PollEvent::RowReady)
    }

    fn handle_prepare_response(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        if packet.first() == Some(&0xff) {
            self.phase = Phase::Idle;
            return Err(ErrPacket::parse(packet)?.into_error());
        }
        let ok = StmtPrepareOk::parse(packet)?;

        if ok.num_params > 0 {
            self.phase = Phase::InCommand(CommandPhase::AwaitPrepare(PreparedResult::PendingParams {
                ok,
                remaining_params: ok.num_params,
                params: Vec::new(),
            }));
        } else if ok.num_columns > 0 {
            self.phase = Phase::InCommand(CommandPhase::AwaitPrepare(PreparedResult::PendingColumns {
                ok,
                params: Vec::new(),
                remaining_columns: ok.num_columns,
                columns: Vec::new(),
            }));
        } else {
            self.finish_prepare(ok, Vec::new(), Vec::new());
            self.phase = Phase::Idle;
            return Ok(PollEvent::Eof);
        }
        Ok(PollEvent::Processing)
    }

    fn handle_prepare_state(&mut self, pr: PreparedResult, packet: &[u8]) -> CResult<PollEvent> {
        match pr {
            PreparedResult::PendingParams {
                ok,
                remaining_params,
                mut params,
            } => {
                let col = ColumnDefinition::parse(packet)?;
                params.push(col);
                let remaining_params = remaining_params - 1;
                self.phase = Phase::InCommand(CommandPhase::AwaitPrepare(if remaining_params == 0 {
                    PreparedResult::PendingParamsEof { ok, params }
                } else {
                    PreparedResult::PendingParams {
                        ok,
                        remaining_params,
                        params,
                    }
                }));
                Ok(PollEvent::Processing)
            }
            PreparedResult::PendingParamsEof { ok, params } => {
                if !EofPacket::is_eof(packet) {
                    return Err(Error::protocol("expected EOF after prepared-statement parameter definitions"));
                }
                EofPacket::parse(packet)?;
                if ok.num_columns > 0 {
                    self.phase = Phase::InCommand(CommandPhase::AwaitPrepare(PreparedResult::PendingColumns {
                        ok,
                        params,
                        remaining_columns: ok.num_columns,
                        columns: Vec::new(),
                    }));
                    Ok(PollEvent::Processing)
                } else {
                    self.finish_prepare(ok, params, Vec::new());
                    self.phase = Phase::Idle;
                    Ok(PollEvent::Eof)
                }
            }
            PreparedResult::PendingColumns {
                ok,
                params,
                remaining_columns,
                mut columns,
            } => {
                let col = ColumnDefinition::parse(packet)?;
                columns.push(col);
                let remaining_columns = remaining_columns - 1;
                self.phase = Phase::InCommand(CommandPhase::AwaitPrepare(if remaining_columns == 0 {
                    PreparedResult::PendingColumnsEof { ok, params, columns }
                } else {
                    PreparedResult::PendingColumns {
                        ok,
                        params,
                        remaining_columns,
                        columns,
                    }
                }));
                Ok(PollEvent::Processing)
            }
            PreparedResult::PendingColumnsEof { ok, params, columns } => {
                if !EofPacket::is_eof(packet) {
                    return Err(Error::protocol("expected EOF after prepared-statement column definitions"));
                }
                EofPacket::parse(packet)?;
                self.finish_prepare(ok, params, columns);
                self.phase = Phase::Idle;
                Ok(PollEvent::Eof)
            }
        }
    }

    fn finish_prepare(&mut self, ok: StmtPrepareOk, params: Vec<ColumnDefinition>, columns: Vec<ColumnDefinition>) {
        self.prepared = Some(PreparedStatementInfo {
            statement_id: ok.statement_id,
            param_count: ok.num_params,
            params: Arc::new(params),
            columns: Arc::new(columns),
        });
    }

    fn handle_simple_ok(&mut self, packet: &[u8]) -> CResult<PollEvent> {
        match packet.first() {
            Some(0x00) => {
                let ok = OkPacket::parse(packet)?;
                self.session.status_flags = ok.status_flags;
                self.last_ok = Some(ok);
                self.phase = Phase::Idle;
                Ok(PollEvent::Eof)
            }
            Some(0xff) => {
                self.phase = Phase::Idle;
                Err(ErrPacket::parse(packet)?.into_error())
            }
            _ => {
                self.phase = Phase::Idle;
                Err(Error::protocol("expected OK or ERR"))
            }
        }
    }
}
