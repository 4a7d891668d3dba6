//! Text protocol result row (SPEC_FULL.md §4.6): each cell is either a
//! length-encoded string or the 0xFB NULL marker.

use crate::codec::Reader;
use crate::error::CResult;

#[derive(Debug, Clone)]
pub struct TextRow {
    pub cells: Vec<Option<Vec<u8>>>,
}

impl TextRow {
    pub fn parse(packet: &[u8], column_count: usize) -> CResult<Self> {
        let mut r = Reader::new(packet);
        let mut cells = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            cells.push(r.read_lenenc_str()?);
        }
        Ok(TextRow { cells })
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    pub fn get_str(&self, index: usize) -> Option<std::borrow::Cow<'_, str>> {
        self.get(index).map(String::from_utf8_lossy)
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }
}
