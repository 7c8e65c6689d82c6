// adz_core/src/domain.rs
use crate::container::record::EntryKind;
use serde::Serialize;

/// One line of a listing: a record placed at its depth in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub depth: usize,
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    /// Bytes for files, descendant records for directories
    pub size: u32,
    pub mode: u32,
    pub owner: u32,
    pub group: u32,
}

impl TreeRow {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
