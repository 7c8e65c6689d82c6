use crate::error::{AdzError, Result};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;

/// Width of the `name` and `path` fields, NUL terminator included.
pub const NAME_LEN: usize = 256;
pub const RECORD_LEN: usize = 533;

// Layout: [0..256]=name, [256]=kind, [257..513]=path, then five u32 LE fields
const KIND_AT: usize = NAME_LEN;
const PATH_AT: usize = KIND_AT + 1;
const OWNER_AT: usize = PATH_AT + NAME_LEN;
const GROUP_AT: usize = OWNER_AT + 4;
const MODE_AT: usize = GROUP_AT + 4;
const SIZE_AT: usize = MODE_AT + 4;
const OFFSET_AT: usize = SIZE_AT + 4;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File = 1,
    Directory = 2,
}

impl EntryKind {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(EntryKind::File),
            2 => Some(EntryKind::Directory),
            _ => None,
        }
    }
}

/// One row of the metadata table.
///
/// `size` is overloaded: byte length for a file, number of records in the
/// directory's subtree (all descendants, not just children) for a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRecord {
    pub name: String,
    pub kind: EntryKind,
    pub path: String,
    pub owner: u32,
    pub group: u32,
    pub mode: u32,
    pub size: u32,
    pub content_offset: u32,
}

impl EntryRecord {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn encode(&self) -> Result<[u8; RECORD_LEN]> {
        let mut buf = [0u8; RECORD_LEN];
        put_str(&mut buf[..KIND_AT], &self.name)
            .map_err(|r| AdzError::limit(Path::new(&self.path), format!("name {r}")))?;
        buf[KIND_AT] = self.kind as u8;
        put_str(&mut buf[PATH_AT..OWNER_AT], &self.path)
            .map_err(|r| AdzError::limit(Path::new(&self.path), format!("path {r}")))?;
        buf[OWNER_AT..GROUP_AT].copy_from_slice(&self.owner.to_le_bytes());
        buf[GROUP_AT..MODE_AT].copy_from_slice(&self.group.to_le_bytes());
        buf[MODE_AT..SIZE_AT].copy_from_slice(&self.mode.to_le_bytes());
        buf[SIZE_AT..OFFSET_AT].copy_from_slice(&self.size.to_le_bytes());
        buf[OFFSET_AT..].copy_from_slice(&self.content_offset.to_le_bytes());
        Ok(buf)
    }

    pub fn decode(buf: &[u8; RECORD_LEN]) -> Result<Self> {
        let kind = EntryKind::from_u8(buf[KIND_AT])
            .ok_or_else(|| AdzError::corrupt(format!("unknown entry kind {}", buf[KIND_AT])))?;
        Ok(Self {
            name: get_str(&buf[..KIND_AT], "name")?,
            kind,
            path: get_str(&buf[PATH_AT..OWNER_AT], "path")?,
            owner: le32(&buf[OWNER_AT..GROUP_AT]),
            group: le32(&buf[GROUP_AT..MODE_AT]),
            mode: le32(&buf[MODE_AT..SIZE_AT]),
            size: le32(&buf[SIZE_AT..OFFSET_AT]),
            content_offset: le32(&buf[OFFSET_AT..]),
        })
    }

    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let mut buf = [0u8; RECORD_LEN];
        r.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => AdzError::corrupt("metadata table truncated"),
            _ => AdzError::Io(e),
        })?;
        Self::decode(&buf)
    }
}

pub fn write_table(mut w: impl Write, records: &[EntryRecord]) -> Result<()> {
    for rec in records {
        w.write_all(&rec.encode()?)?;
    }
    Ok(())
}

/// Checks that `s` fits a NUL-terminated bounded field.
pub fn check_field(s: &str) -> std::result::Result<(), String> {
    if s.len() >= NAME_LEN {
        return Err(format!("is {} bytes, limit is {}", s.len(), NAME_LEN - 1));
    }
    if s.as_bytes().contains(&0) {
        return Err("contains a NUL byte".to_string());
    }
    Ok(())
}

fn put_str(dst: &mut [u8], s: &str) -> std::result::Result<(), String> {
    check_field(s)?;
    dst[..s.len()].copy_from_slice(s.as_bytes());
    Ok(())
}

fn get_str(field: &[u8], what: &str) -> Result<String> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| AdzError::corrupt(format!("{what} field is not NUL-terminated")))?;
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| AdzError::corrupt(format!("{what} field is not valid UTF-8")))
}

#[inline]
fn le32(x: &[u8]) -> u32 {
    u32::from_le_bytes([x[0], x[1], x[2], x[3]])
}
