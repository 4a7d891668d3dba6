//! Structured error model (see SPEC_FULL.md §7).
//!
//! Every error the core surfaces carries a numeric code, a SQLSTATE, a
//! human message and an origin tag. `Error::WouldBlock` deliberately does
//! not exist here -- "no progress possible yet" is represented by
//! [`crate::conn::PollEvent::None`], not by an error.

use std::io;
use thiserror::Error;

/// Client-side error codes live in the range MySQL reserves for the
/// client library (2000-2999); server errors are forwarded verbatim.
pub mod client_codes {
    pub const UNKNOWN: u32 = 2000;
    pub const CONNECTION_ERROR: u32 = 2002;
    pub const NOT_CONNECTED: u32 = 2006;
    pub const PROTOCOL_ERROR: u32 = 2013;
    pub const AUTH_PLUGIN_ERROR: u32 = 2061;
    pub const PARAM_OUT_OF_RANGE: u32 = 2070;
    pub const TLS_ERROR: u32 = 2071;
}

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    Client,
    Server,
}

/// A structured protocol/driver error.
#[derive(Debug, Error)]
#[error("[{sqlstate}] ({code}) {message}")]
pub struct Error {
    pub code: u32,
    pub sqlstate: String,
    pub message: String,
    pub origin: ErrorOrigin,
}

impl Error {
    pub fn client(code: u32, message: impl Into<String>) -> Self {
        Error {
            code,
            sqlstate: "HY000".to_string(),
            message: message.into(),
            origin: ErrorOrigin::Client,
        }
    }

    pub fn server(code: u32, sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Error {
            code,
            sqlstate: sqlstate.into(),
            message: message.into(),
            origin: ErrorOrigin::Server,
        }
    }

    pub fn not_connected() -> Self {
        Error::client(client_codes::NOT_CONNECTED, "Not connected")
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Error::client(client_codes::PROTOCOL_ERROR, message)
    }

    pub fn param_out_of_range(index: u16, param_count: u16) -> Self {
        Error::client(
            client_codes::PARAM_OUT_OF_RANGE,
            format!("Parameter index {index} out of range (statement has {param_count} params)"),
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.origin == ErrorOrigin::Client
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::client(client_codes::CONNECTION_ERROR, err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::protocol(format!("invalid utf-8 in wire data: {err}"))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::protocol(format!("invalid utf-8 in wire data: {err}"))
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Error::client(client_codes::TLS_ERROR, err.to_string())
    }
}

pub type CResult<T> = Result<T, Error>;
