use crate::container::header::{HEADER_LEN, Header};
use crate::container::record::RECORD_LEN;
use crate::error::{AdzError, Result};
use crate::read::walk::RecordWalker;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// An archive whose header has been validated against the file length.
pub struct Opened {
    pub path: PathBuf,
    pub header: Header,
    pub file_len: u64,
    f: File,
}

impl Opened {
    pub fn open(path: &Path) -> Result<Self> {
        let mut f = File::open(path).map_err(|e| AdzError::from_source(path, e))?;
        let file_len = f.metadata()?.len();

        let header = Header::read_from(&mut f)?;

        // bounds
        let table_off = header.metadata_offset as u64;
        if table_off < HEADER_LEN {
            return Err(AdzError::corrupt(format!(
                "metadata offset {table_off} points into the header"
            )));
        }
        let table_end = table_off + header.entry_count as u64 * RECORD_LEN as u64;
        if table_end > file_len {
            return Err(AdzError::corrupt(format!(
                "metadata table ends at {table_end}, file is {file_len} bytes"
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            header,
            file_len,
            f,
        })
    }

    pub fn table_end(&self) -> u64 {
        self.header.metadata_offset as u64 + self.header.entry_count as u64 * RECORD_LEN as u64
    }

    /// Independent handle for reading file content while the table is being walked.
    pub fn content_handle(&self) -> Result<File> {
        Ok(File::open(&self.path)?)
    }

    /// Consume the archive into a pre-order walk over its metadata table.
    pub fn into_records(mut self) -> Result<RecordWalker<BufReader<File>>> {
        self.f
            .seek(SeekFrom::Start(self.header.metadata_offset as u64))?;
        Ok(RecordWalker::new(
            BufReader::with_capacity(64 * RECORD_LEN, self.f),
            self.header,
        ))
    }
}
