//! The result-set data model a [`crate::conn::connection::Connection`]
//! exposes while streaming rows (SPEC_FULL.md §3, §4.6).

use std::sync::Arc;

use crate::packet::column_def::ColumnDefinition;

pub use crate::packet::row_binary::BinaryRow;
pub use crate::packet::row_text::TextRow;

/// A streaming result set's column metadata, shared by reference between
/// the [`crate::conn::connection::Connection`] and every row decoded from
/// it so column lookups don't re-copy on each row.
#[derive(Debug, Clone)]
pub struct ResultSetMeta {
    pub columns: Arc<Vec<ColumnDefinition>>,
}

impl ResultSetMeta {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
