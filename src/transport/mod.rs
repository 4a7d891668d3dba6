//! Non-blocking byte transport: TCP/UNIX socket connect plus optional TLS
//! upgrade (SPEC_FULL.md §4.3). This layer is deliberately ignorant of
//! MySQL framing -- it only exchanges opaque byte slices with the caller's
//! event loop, which owns the actual readability/writability polling
//! (assumed to be an external collaborator, per SPEC_FULL.md §1).

pub mod tcp;
pub mod tls;
pub mod uds;

use std::io::{self, Read, Write};
use std::path::Path;

use crate::conn::options::{ConnectionOptions, SslMode};
use crate::error::CResult;

/// Outcome of a single non-blocking I/O attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOutcome {
    Ready(usize),
    WouldBlock,
}

fn classify_io_result(result: io::Result<usize>) -> CResult<IoOutcome> {
    match result {
        Ok(n) => Ok(IoOutcome::Ready(n)),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(IoOutcome::WouldBlock),
        Err(e) => Err(e.into()),
    }
}

enum Stream {
    Tcp(tcp::NonBlockingTcp),
    Uds(uds::NonBlockingUds),
    TlsHandshaking(tls::HandshakeInProgress),
    Tls(tls::TlsStream),
}

pub struct Transport {
    // Always `Some` except for the instant inside `start_tls`/
    // `drive_handshake` where the stream is being swapped for its upgraded
    // form; no observer can see it as `None`.
    stream: Option<Stream>,
}

impl Transport {
    pub fn connect_tcp(host: &str, port: u16) -> CResult<Self> {
        Ok(Transport {
            stream: Some(Stream::Tcp(tcp::NonBlockingTcp::connect(host, port)?)),
        })
    }

    pub fn connect_uds(path: &Path) -> CResult<Self> {
        Ok(Transport {
            stream: Some(Stream::Uds(uds::NonBlockingUds::connect(path)?)),
        })
    }

    fn stream_mut(&mut self) -> &mut Stream {
        self.stream.as_mut().expect("transport stream always present")
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.stream, Some(Stream::Tls(_)))
    }

    /// `true` once a TLS upgrade has started and needs to complete before
    /// plaintext reads/writes may resume.
    pub fn is_handshaking(&self) -> bool {
        matches!(self.stream, Some(Stream::TlsHandshaking(_)))
    }

    /// Begins the TLS upgrade in place of the raw TCP stream. Call
    /// [`Transport::drive_handshake`] on subsequent polls until it reports
    /// completion.
    pub fn start_tls(&mut self, domain: &str, ssl_mode: SslMode, options: &ConnectionOptions) -> CResult<()> {
        let Some(Stream::Tcp(tcp)) = self.stream.take() else {
            return Err(crate::error::Error::protocol("TLS upgrade requested on a non-TCP stream"));
        };
        self.stream = Some(tls::begin_handshake(tcp, domain, ssl_mode, options)?);
        Ok(())
    }

    /// Advances an in-progress TLS handshake. Returns `true` once complete.
    pub fn drive_handshake(&mut self) -> CResult<bool> {
        match self.stream.take().expect("transport stream always present") {
            Stream::TlsHandshaking(mid) => match tls::resume_handshake(mid)? {
                tls::HandshakeProgress::Done(stream) => {
                    self.stream = Some(Stream::Tls(stream));
                    Ok(true)
                }
                tls::HandshakeProgress::Pending(mid) => {
                    self.stream = Some(Stream::TlsHandshaking(mid));
                    Ok(false)
                }
            },
            other => {
                self.stream = Some(other);
                Ok(true)
            }
        }
    }

    pub fn try_read(&mut self, buf: &mut [u8]) -> CResult<IoOutcome> {
        let result = match self.stream_mut() {
            Stream::Tcp(t) => t.read(buf),
            Stream::Uds(t) => t.read(buf),
            Stream::Tls(t) => t.read(buf),
            Stream::TlsHandshaking(_) => {
                return Err(crate::error::Error::protocol("read attempted mid-TLS-handshake"))
            }
        };
        classify_io_result(result)
    }

    pub fn try_write(&mut self, buf: &[u8]) -> CResult<IoOutcome> {
        let result = match self.stream_mut() {
            Stream::Tcp(t) => t.write(buf),
            Stream::Uds(t) => t.write(buf),
            Stream::Tls(t) => t.write(buf),
            Stream::TlsHandshaking(_) => {
                return Err(crate::error::Error::protocol("write attempted mid-TLS-handshake"))
            }
        };
        classify_io_result(result)
    }
}
