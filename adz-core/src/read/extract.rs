use crate::container::header::HEADER_LEN;
use crate::container::record::{EntryKind, EntryRecord};
use crate::error::{AdzError, Result};
use crate::read::opened::Opened;
use crate::stats::Summary;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Apply stored permission bits to extracted entries.
    pub restore_permissions: bool,
    /// Apply stored owner/group; usually needs privilege, failures are only logged.
    pub restore_ownership: bool,
}

/// Recreate the archived tree under `dest`, overwriting existing files.
///
/// Entries extracted before an error are left in place.
pub fn extract(archive: &Path, dest: &Path, opts: Option<&ExtractOptions>) -> Result<()> {
    let opts = opts.cloned().unwrap_or_default();
    let opened = Opened::open(archive)?;
    let mut content = opened.content_handle()?;
    let records = opened.into_records()?;

    fs::create_dir_all(dest)?;

    // Directory metadata is applied last so read-only modes cannot block their children.
    let mut dirs: Vec<(PathBuf, EntryRecord)> = Vec::new();
    let mut files = 0u64;

    for item in records {
        let rec = item?.record;
        let target = safe_join(dest, &rec.path)?;
        match rec.kind {
            EntryKind::Directory => {
                fs::create_dir_all(&target)?;
                debug!(path = %rec.path, "created directory");
                dirs.push((target, rec));
            }
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                write_file(&mut content, &rec, &target)?;
                apply_metadata(&target, &rec, &opts)?;
                files += 1;
                debug!(path = %rec.path, size = rec.size, "extracted file");
            }
        }
    }

    for (path, rec) in dirs.iter().rev() {
        apply_metadata(path, rec, &opts)?;
    }

    info!(files, dirs = dirs.len(), dest = %dest.display(), "extract complete");
    Ok(())
}

fn write_file(content: &mut File, rec: &EntryRecord, target: &Path) -> Result<()> {
    content.seek(SeekFrom::Start(rec.content_offset as u64))?;
    let mut out = BufWriter::new(create_truncating(target)?);
    let want = rec.size as u64;
    let n = io::copy(&mut (&mut *content).take(want), &mut out)?;
    if n != want {
        return Err(AdzError::corrupt(format!(
            "content of {:?} ends after {n} of {want} bytes",
            rec.path
        )));
    }
    out.flush()?;
    Ok(())
}

/// `File::create`, replacing an existing read-only file instead of failing on it.
fn create_truncating(target: &Path) -> Result<File> {
    match File::create(target) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied && target.is_file() => {
            fs::remove_file(target)?;
            Ok(File::create(target)?)
        }
        Err(e) => Err(e.into()),
    }
}

fn apply_metadata(path: &Path, rec: &EntryRecord, opts: &ExtractOptions) -> Result<()> {
    // chown before chmod: a successful chown may clear setuid/setgid
    if opts.restore_ownership {
        #[cfg(unix)]
        {
            if let Err(e) = std::os::unix::fs::chown(path, Some(rec.owner), Some(rec.group)) {
                warn!(path = %path.display(), owner = rec.owner, group = rec.group, error = %e, "could not restore ownership");
            }
        }
    }
    if opts.restore_permissions {
        set_mode(path, rec.mode & 0o7777)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    let mut comps = p.components().peekable();
    if comps.peek().is_none() || !comps.all(|c| matches!(c, Component::Normal(_))) {
        return Err(AdzError::corrupt(format!("unsafe path: {rel:?}")));
    }
    Ok(root.join(p))
}

/// Full structural check of a container without extracting anything.
///
/// Beyond what list/extract enforce, this requires that the table ends at
/// EOF, that every path is its parent's path plus its own name, and that the
/// file ranges tile the content region exactly.
pub fn verify(archive: &Path) -> Result<Summary> {
    let opened = Opened::open(archive)?;
    let mut summary = Summary {
        entry_count: opened.header.entry_count,
        metadata_offset: opened.header.metadata_offset,
        archive_len: opened.file_len,
        ..Default::default()
    };
    let table_end = opened.table_end();
    if table_end != opened.file_len {
        return Err(AdzError::corrupt(format!(
            "{} trailing bytes after metadata table",
            opened.file_len - table_end
        )));
    }

    let mut ancestors: Vec<String> = Vec::new();
    let mut ranges: Vec<(u64, u64, u32)> = Vec::new();

    for item in opened.into_records()? {
        let item = item?;
        let rec = &item.record;
        if rec.name.is_empty() || rec.name.contains('/') {
            return Err(AdzError::corrupt(format!(
                "record {} has invalid name {:?}",
                item.index, rec.name
            )));
        }
        ancestors.truncate(item.depth);
        let expected = match ancestors.last() {
            Some(parent) => format!("{parent}/{}", rec.name),
            None => rec.name.clone(),
        };
        if rec.path != expected {
            return Err(AdzError::corrupt(format!(
                "record {} path {:?} does not match its position (expected {expected:?})",
                item.index, rec.path
            )));
        }

        match rec.kind {
            EntryKind::Directory => {
                summary.dirs += 1;
                ancestors.push(rec.path.clone());
            }
            EntryKind::File => {
                summary.files += 1;
                summary.content_bytes += rec.size as u64;
                if rec.size > 0 {
                    let start = rec.content_offset as u64;
                    ranges.push((start, start + rec.size as u64, item.index));
                }
            }
        }
    }

    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        let ((_, prev_end, a), (start, _, b)) = (pair[0], pair[1]);
        if start < prev_end {
            return Err(AdzError::corrupt(format!(
                "content of records {a} and {b} overlaps"
            )));
        }
    }

    let region = summary.metadata_offset as u64 - HEADER_LEN;
    if summary.content_bytes != region {
        return Err(AdzError::corrupt(format!(
            "files account for {} of {region} content bytes",
            summary.content_bytes
        )));
    }

    Ok(summary)
}
