//! TLS upgrade via openssl's non-blocking handshake resumption
//! (SPEC_FULL.md §4.3): the Rust-idiomatic equivalent of pumping OpenSSL's
//! BIO pair by hand, as the original C client does.

use std::net::TcpStream;

use openssl::ssl::{HandshakeError, MidHandshakeSslStream, SslConnector, SslMethod, SslVerifyMode};

use crate::conn::options::{ConnectionOptions, SslMode as CoreSslMode};
use crate::error::{client_codes, CResult, Error};

use super::tcp::NonBlockingTcp;

pub type TlsStream = openssl::ssl::SslStream<TcpStream>;
pub type HandshakeInProgress = MidHandshakeSslStream<TcpStream>;

pub enum HandshakeProgress {
    Done(TlsStream),
    Pending(HandshakeInProgress),
}

pub(super) fn begin_handshake(
    tcp: NonBlockingTcp,
    domain: &str,
    ssl_mode: CoreSslMode,
    options: &ConnectionOptions,
) -> CResult<super::Stream> {
    let ssl_opts = options
        .ssl_opts
        .as_ref()
        .ok_or_else(|| Error::client(client_codes::TLS_ERROR, "SSL requested but no SslOpts configured"))?;

    let mut builder = SslConnector::builder(SslMethod::tls())?;

    if let Some(root_cert_path) = ssl_opts.root_cert_path() {
        builder.set_ca_file(root_cert_path)?;
    }
    if let Some((cert_path, key_path)) = ssl_opts.client_identity() {
        builder.set_certificate_file(cert_path, openssl::ssl::SslFiletype::PEM)?;
        builder.set_private_key_file(key_path, openssl::ssl::SslFiletype::PEM)?;
    }
    if ssl_opts.accept_invalid_certs() || matches!(ssl_mode, CoreSslMode::Disabled) {
        builder.set_verify(SslVerifyMode::NONE);
    }

    let connector = builder.build();
    let config = connector.configure()?.verify_hostname(!ssl_opts.skip_domain_validation());

    let raw = tcp.into_inner();
    match config.connect(domain, raw) {
        Ok(stream) => Ok(super::Stream::Tls(stream)),
        Err(HandshakeError::WouldBlock(mid)) => Ok(super::Stream::TlsHandshaking(mid)),
        Err(HandshakeError::Failure(mid)) => Err(Error::client(
            client_codes::TLS_ERROR,
            format!("TLS handshake failed: {}", mid.error()),
        )),
        Err(HandshakeError::SetupFailure(e)) => Err(Error::client(client_codes::TLS_ERROR, e.to_string())),
    }
}

pub(super) fn resume_handshake(mid: HandshakeInProgress) -> CResult<HandshakeProgress> {
    match mid.handshake() {
        Ok(stream) => Ok(HandshakeProgress::Done(stream)),
        Err(HandshakeError::WouldBlock(mid)) => Ok(HandshakeProgress::Pending(mid)),
        Err(HandshakeError::Failure(mid)) => Err(Error::client(
            client_codes::TLS_ERROR,
            format!("TLS handshake failed: {}", mid.error()),
        )),
        Err(HandshakeError::SetupFailure(e)) => Err(Error::client(client_codes::TLS_ERROR, e.to_string())),
    }
}

