//! Connection configuration (SPEC_FULL.md §3, §17): host/port or socket
//! path, credentials, schema, protocol mode, compression and TLS options.
//! Grounded in the teacher's `connection_options.rs`, stripped of the
//! binlog/replication fields that don't apply to this core.

use std::path::PathBuf;

/// Which transport to attempt. `Auto` picks a UNIX domain socket when the
/// host is "localhost" and `uds_path` is set, otherwise TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Auto,
    Tcp,
    Uds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    #[default]
    Disabled,
    Required,
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub hostname: String,
    pub port: u16,
    pub uds_path: Option<PathBuf>,
    pub protocol: Protocol,

    pub username: String,
    pub password: String,
    pub database: Option<String>,

    pub ssl_mode: SslMode,
    pub ssl_opts: Option<SslOpts>,

    /// Request CLIENT_COMPRESS during the handshake.
    pub compress: bool,

    /// Present in the source API but with undocumented semantics (see
    /// SPEC_FULL.md §9 Open Questions); read nowhere in this core.
    pub semi_block: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            hostname: "localhost".to_string(),
            port: 3306,
            uds_path: None,
            protocol: Protocol::Auto,
            username: String::new(),
            password: String::new(),
            database: None,
            ssl_mode: SslMode::Disabled,
            ssl_opts: None,
            compress: false,
            semi_block: false,
        }
    }
}

impl ConnectionOptions {
    pub fn new(hostname: impl Into<String>, port: u16, username: impl Into<String>, password: impl Into<String>) -> Self {
        ConnectionOptions {
            hostname: hostname.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_ssl(mut self, ssl_mode: SslMode, ssl_opts: SslOpts) -> Self {
        self.ssl_mode = ssl_mode;
        self.ssl_opts = Some(ssl_opts);
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Resolves `Protocol::Auto` into a concrete transport choice.
    pub fn resolved_protocol(&self) -> Protocol {
        match self.protocol {
            Protocol::Auto if self.hostname == "localhost" && self.uds_path.is_some() => Protocol::Uds,
            Protocol::Auto => Protocol::Tcp,
            other => other,
        }
    }
}

/// TLS material: CA cert for server verification, client cert/key for
/// mutual TLS, and relaxed-verification escape hatches. Uses PEM paths
/// (openssl-native) rather than the teacher's pkcs12 identity bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslOpts {
    root_cert_path: Option<PathBuf>,
    client_cert_path: Option<PathBuf>,
    client_key_path: Option<PathBuf>,
    skip_domain_validation: bool,
    accept_invalid_certs: bool,
}

impl SslOpts {
    pub fn with_root_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_cert_path = Some(path.into());
        self
    }

    pub fn with_client_identity(mut self, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        self.client_cert_path = Some(cert_path.into());
        self.client_key_path = Some(key_path.into());
        self
    }

    pub fn with_danger_skip_domain_validation(mut self, value: bool) -> Self {
        self.skip_domain_validation = value;
        self
    }

    pub fn with_danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.accept_invalid_certs = value;
        self
    }

    pub fn root_cert_path(&self) -> Option<&std::path::Path> {
        self.root_cert_path.as_deref()
    }

    pub fn client_identity(&self) -> Option<(&std::path::Path, &std::path::Path)> {
        match (&self.client_cert_path, &self.client_key_path) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }

    pub fn skip_domain_validation(&self) -> bool {
        self.skip_domain_validation
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}
