use crate::container::header::{HEADER_LEN, Header};
use crate::container::record::{EntryKind, EntryRecord};
use crate::error::{AdzError, Result};
use std::io::Read;

#[derive(Clone, Debug)]
pub struct WalkItem {
    /// Position in the metadata table
    pub index: u32,
    /// 0 for the root record
    pub depth: usize,
    pub record: EntryRecord,
}

/// Lazy pre-order walk over a metadata table.
///
/// Each directory claims the next `size` records as its subtree; the walker
/// keeps the end index of every open directory so depth falls out of the
/// stack height. This is the recursive partition unrolled into a loop.
/// Any inconsistency ends the walk with `CorruptArchive`, after which the
/// iterator yields nothing more.
pub struct RecordWalker<R> {
    r: R,
    header: Header,
    next: u32,
    open: Vec<u64>,
    done: bool,
}

impl<R: Read> RecordWalker<R> {
    /// `r` must be positioned at the first record.
    pub fn new(r: R, header: Header) -> Self {
        Self {
            r,
            header,
            next: 0,
            open: Vec::new(),
            done: false,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    fn step(&mut self) -> Result<WalkItem> {
        let index = self.next;
        while self.open.last().is_some_and(|&end| end <= index as u64) {
            self.open.pop();
        }
        if index > 0 && self.open.is_empty() {
            return Err(AdzError::corrupt(format!(
                "record {index} lies outside the root subtree"
            )));
        }

        let record = EntryRecord::read_from(&mut self.r)?;
        let depth = self.open.len();
        match record.kind {
            EntryKind::Directory => {
                let end = index as u64 + 1 + record.size as u64;
                let limit = self
                    .open
                    .last()
                    .copied()
                    .unwrap_or(self.header.entry_count as u64);
                if end > limit {
                    return Err(AdzError::corrupt(format!(
                        "directory {:?} claims {} descendants, only {} records remain in its parent",
                        record.path,
                        record.size,
                        limit - index as u64 - 1
                    )));
                }
                self.open.push(end);
            }
            EntryKind::File => {
                let start = record.content_offset as u64;
                let stop = start + record.size as u64;
                if start < HEADER_LEN || stop > self.header.metadata_offset as u64 {
                    return Err(AdzError::corrupt(format!(
                        "content of {:?} ({start}..{stop}) is outside {HEADER_LEN}..{}",
                        record.path, self.header.metadata_offset
                    )));
                }
            }
        }

        self.next += 1;
        Ok(WalkItem {
            index,
            depth,
            record,
        })
    }
}

impl<R: Read> Iterator for RecordWalker<R> {
    type Item = Result<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.header.entry_count {
            return None;
        }
        match self.step() {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
