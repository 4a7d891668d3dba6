//! Authentication plugin identifiers (SPEC_FULL.md §4.4).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MysqlNativePassword,
    CachingSha2Password,
}

impl AuthPlugin {
    pub fn name(&self) -> &'static str {
        match self {
            AuthPlugin::MysqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mysql_native_password" => Some(AuthPlugin::MysqlNativePassword),
            "caching_sha2_password" => Some(AuthPlugin::CachingSha2Password),
            _ => None,
        }
    }
}

/// `caching_sha2_password` fast-auth result byte sent in an
/// AuthMoreData-wrapped message following the initial response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sha2FastAuthResult {
    Success,
    FullAuthRequired,
}

impl Sha2FastAuthResult {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x03 => Some(Sha2FastAuthResult::Success),
            0x04 => Some(Sha2FastAuthResult::FullAuthRequired),
            _ => None,
        }
    }
}
