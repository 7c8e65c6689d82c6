use serde::Serialize;

/// Shape of a container as established by `verify`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub entry_count: u32,
    pub dirs: u32,
    pub files: u32,
    pub content_bytes: u64,
    pub metadata_offset: u32,
    pub archive_len: u64,
}
