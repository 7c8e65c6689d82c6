use crate::domain::TreeRow;
use crate::error::Result;
use crate::read::opened::Opened;
use crate::read::walk::RecordWalker;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Lazy pre-order listing; reopen the archive to list again.
pub struct Listing {
    inner: RecordWalker<BufReader<File>>,
}

impl Listing {
    pub fn entry_count(&self) -> u32 {
        self.inner.header().entry_count
    }
}

impl Iterator for Listing {
    type Item = Result<TreeRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| {
            item.map(|w| TreeRow {
                depth: w.depth,
                path: w.record.path,
                name: w.record.name,
                kind: w.record.kind,
                size: w.record.size,
                mode: w.record.mode,
                owner: w.record.owner,
                group: w.record.group,
            })
        })
    }
}

/// Open `archive` and list its tree without touching file content.
pub fn list(archive: &Path) -> Result<Listing> {
    let opened = Opened::open(archive)?;
    Ok(Listing {
        inner: opened.into_records()?,
    })
}
