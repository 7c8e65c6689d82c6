use crate::container::header::{HEADER_LEN, Header};
use crate::container::record::{EntryKind, EntryRecord, write_table};
use crate::error::{AdzError, Result};
use crate::pack::planner::{CreateOptions, Plan, plan};
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Archive `source` (file or directory) into a new container at `dest`.
///
/// Returns the number of records written. On any error nothing is left at `dest`.
pub fn create(source: &Path, dest: &Path, opts: Option<&CreateOptions>) -> Result<u32> {
    let plan = plan(source, opts)?;
    write_plan(&plan, dest)?;
    info!(
        entries = plan.entry_count(),
        content_bytes = plan.content_len,
        dest = %dest.display(),
        "container created"
    );
    Ok(plan.entry_count())
}

/// Second pass: header placeholder, content region, metadata table, final header.
///
/// Bytes go to a temp file beside `dest` that is renamed into place only once
/// the final header is on disk.
pub fn write_plan(plan: &Plan, dest: &Path) -> Result<()> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    let mut out = BufWriter::with_capacity(1 << 16, tmp);

    Header::placeholder().write_to(&mut out)?;

    let mut cursor = HEADER_LEN;
    for e in plan.entries.iter().filter(|e| e.record.kind == EntryKind::File) {
        debug_assert_eq!(cursor, e.record.content_offset as u64);
        copy_content(&e.source, &e.record, &mut out)?;
        cursor += e.record.size as u64;
        debug!(path = %e.record.path, size = e.record.size, "wrote content");
    }
    debug_assert_eq!(cursor, plan.metadata_offset as u64);

    let records: Vec<EntryRecord> = plan.records().cloned().collect();
    write_table(&mut out, &records)?;

    // finalize header
    out.seek(SeekFrom::Start(0))?;
    Header::new(plan.entry_count(), plan.metadata_offset).write_to(&mut out)?;

    let tmp = out.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| AdzError::Io(e.error))?;
    Ok(())
}

/// Stream exactly the planned number of bytes; a size change since planning aborts.
fn copy_content<W: Write>(src: &Path, rec: &EntryRecord, out: &mut W) -> Result<()> {
    let mut f = File::open(src).map_err(|e| AdzError::from_source(src, e))?;
    let expected = rec.size as u64;
    let copied = io::copy(&mut (&mut f).take(expected), out)?;
    let actual = if copied < expected {
        copied
    } else {
        f.metadata()?.len()
    };
    if actual != expected {
        return Err(AdzError::SourceChanged {
            path: src.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::record::RECORD_LEN;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn container_is_header_content_table() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), b"abcd").unwrap();
        fs::write(root.join("sub/b.txt"), b"xy").unwrap();
        let out = dir.path().join("out.adz");

        let n = create(&root, &out, None).unwrap();
        assert_eq!(n, 4);

        let bytes = fs::read(&out).unwrap();
        let header = Header::read_from(&bytes[..]).unwrap();
        assert_eq!(header.entry_count, 4);
        assert_eq!(header.metadata_offset, 18);
        assert_eq!(&bytes[12..18], b"abcdxy");
        assert_eq!(bytes.len(), 18 + 4 * RECORD_LEN);
    }

    #[test]
    fn shrunk_source_is_rejected() {
        let dir = tempdir().unwrap();
        let f = dir.path().join("grow.txt");
        fs::write(&f, b"0123456789").unwrap();
        let p = plan(&f, None).unwrap();
        fs::write(&f, b"01").unwrap();

        let out = dir.path().join("out.adz");
        let err = write_plan(&p, &out).unwrap_err();
        assert!(matches!(
            err,
            AdzError::SourceChanged {
                expected: 10,
                actual: 2,
                ..
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn grown_source_is_rejected() {
        let dir = tempdir().unwrap();
        let f = dir.path().join("grow.txt");
        fs::write(&f, b"01").unwrap();
        let p = plan(&f, None).unwrap();
        fs::write(&f, b"0123").unwrap();

        let err = write_plan(&p, &dir.path().join("out.adz")).unwrap_err();
        assert!(matches!(err, AdzError::SourceChanged { actual: 4, .. }));
    }
}
