//! COM_QUERY (SPEC_FULL.md §4.6).

use super::CommandType;

pub struct QueryCommand<'a> {
    pub sql: &'a str,
}

impl<'a> QueryCommand<'a> {
    pub fn new(sql: &'a str) -> Self {
        QueryCommand { sql }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.sql.len());
        out.push(CommandType::Query as u8);
        out.extend_from_slice(self.sql.as_bytes());
        out
    }
}
