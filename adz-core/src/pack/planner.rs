use crate::container::header::HEADER_LEN;
use crate::container::record::{EntryKind, EntryRecord, RECORD_LEN, check_field};
use crate::error::{AdzError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    /// Store owner and group as 0 so the same tree yields the same bytes on any machine.
    pub deterministic_ids: bool,
}

#[derive(Clone, Debug)]
pub struct PlannedEntry {
    /// Where the bytes come from during the write pass
    pub source: PathBuf,
    pub record: EntryRecord,
}

/// Result of the sizing pass: every record in pre-order with final offsets.
#[derive(Clone, Debug)]
pub struct Plan {
    pub entries: Vec<PlannedEntry>,
    pub content_len: u64,
    pub metadata_offset: u32,
}

impl Plan {
    pub fn entry_count(&self) -> u32 {
        // bounded by `plan`, which rejects more than u32::MAX records
        self.entries.len() as u32
    }

    pub fn table_len(&self) -> u64 {
        self.entries.len() as u64 * RECORD_LEN as u64
    }

    pub fn records(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries.iter().map(|e| &e.record)
    }
}

/// A planned subtree: its records in pre-order and the totals the parent folds in.
struct Subtree {
    entries: Vec<PlannedEntry>,
    descendants: u64,
    content_bytes: u64,
}

impl Subtree {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            descendants: 0,
            content_bytes: 0,
        }
    }
}

/// Walk `root` once (stat calls only) and lay out the container.
///
/// The root itself is record 0. A plain-file root yields a single file
/// record; a root that is neither file nor directory yields an empty plan.
pub fn plan(root: &Path, opts: Option<&CreateOptions>) -> Result<Plan> {
    let ids = !opts.map(|o| o.deterministic_ids).unwrap_or(false);
    let md = fs::metadata(root).map_err(|e| AdzError::from_source(root, e))?;
    let name = root_name(root)?;

    let tree = if md.is_dir() {
        plan_dir(root, &name, &name, &md, ids)?
    } else if md.is_file() {
        plan_file(root, &name, &name, &md, ids)?
    } else {
        warn!(path = %root.display(), "root is neither a file nor a directory; archive will be empty");
        Subtree::empty()
    };

    if tree.entries.len() as u64 > u32::MAX as u64 {
        return Err(AdzError::limit(root, "more than u32::MAX entries"));
    }
    let max_content = u32::MAX as u64 - HEADER_LEN;
    if tree.content_bytes > max_content {
        return Err(AdzError::limit(
            root,
            format!(
                "{} content bytes do not fit 32-bit offsets",
                tree.content_bytes
            ),
        ));
    }

    // Content offsets follow record order, so one fold over the pre-order list suffices.
    let mut entries = tree.entries;
    let mut cursor = HEADER_LEN;
    for e in entries.iter_mut().filter(|e| e.record.kind == EntryKind::File) {
        e.record.content_offset = cursor as u32;
        cursor += e.record.size as u64;
    }

    debug!(
        entries = entries.len(),
        content_bytes = tree.content_bytes,
        "layout planned"
    );
    Ok(Plan {
        entries,
        content_len: tree.content_bytes,
        metadata_offset: cursor as u32,
    })
}

fn plan_dir(path: &Path, rel: &str, name: &str, md: &fs::Metadata, ids: bool) -> Result<Subtree> {
    let mut children = Vec::new();
    let mut descendants = 0u64;
    let mut content_bytes = 0u64;

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        let child_path = entry.path();
        let child_name = entry
            .file_name()
            .to_str()
            .ok_or_else(|| AdzError::limit(child_path, "name is not valid UTF-8"))?;
        let child_rel = format!("{rel}/{child_name}");
        let ft = entry.file_type();

        let sub = if ft.is_dir() || ft.is_file() {
            let child_md = entry.metadata().map_err(|e| walk_error(child_path, e))?;
            if ft.is_dir() {
                plan_dir(child_path, &child_rel, child_name, &child_md, ids)?
            } else {
                plan_file(child_path, &child_rel, child_name, &child_md, ids)?
            }
        } else {
            warn!(path = %child_path.display(), "skipping non-regular entry");
            continue;
        };

        descendants += 1 + sub.descendants;
        content_bytes += sub.content_bytes;
        children.extend(sub.entries);
    }

    let size = u32::try_from(descendants)
        .map_err(|_| AdzError::limit(path, "directory subtree exceeds u32::MAX entries"))?;
    let mut entries = Vec::with_capacity(children.len() + 1);
    entries.push(planned(path, rel, name, EntryKind::Directory, size, md, ids)?);
    entries.append(&mut children);
    debug!(path = rel, descendants, "planned directory");

    Ok(Subtree {
        entries,
        descendants,
        content_bytes,
    })
}

fn plan_file(path: &Path, rel: &str, name: &str, md: &fs::Metadata, ids: bool) -> Result<Subtree> {
    let len = md.len();
    let size = u32::try_from(len)
        .map_err(|_| AdzError::limit(path, format!("file is {len} bytes, limit is {}", u32::MAX)))?;
    debug!(path = rel, size, "planned file");
    Ok(Subtree {
        entries: vec![planned(path, rel, name, EntryKind::File, size, md, ids)?],
        descendants: 0,
        content_bytes: len,
    })
}

fn planned(
    path: &Path,
    rel: &str,
    name: &str,
    kind: EntryKind,
    size: u32,
    md: &fs::Metadata,
    ids: bool,
) -> Result<PlannedEntry> {
    check_field(name).map_err(|r| AdzError::limit(path, format!("name {r}")))?;
    check_field(rel).map_err(|r| AdzError::limit(path, format!("archive path {r}")))?;
    let (owner, group) = if ids { owner_from(md) } else { (0, 0) };
    Ok(PlannedEntry {
        source: path.to_path_buf(),
        record: EntryRecord {
            name: name.to_string(),
            kind,
            path: rel.to_string(),
            owner,
            group,
            mode: mode_from(md),
            size,
            content_offset: 0,
        },
    })
}

fn root_name(root: &Path) -> Result<String> {
    let named = match root.file_name() {
        Some(n) => n.to_os_string(),
        // ".", ".." or "/": name the root after what it resolves to
        None => {
            let canon = fs::canonicalize(root).map_err(|e| AdzError::from_source(root, e))?;
            canon
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "root".into())
        }
    };
    named
        .into_string()
        .map_err(|_| AdzError::limit(root, "name is not valid UTF-8"))
}

fn walk_error(fallback: &Path, err: walkdir::Error) -> AdzError {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    match err.into_io_error() {
        Some(e) => AdzError::from_source(&path, e),
        None => AdzError::Io(io::Error::other(format!(
            "filesystem loop at {}",
            path.display()
        ))),
    }
}

fn mode_from(md: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        md.mode()
    }
    #[cfg(not(unix))]
    {
        if md.is_dir() { 0o040755 } else { 0o100644 }
    }
}

fn owner_from(_md: &fs::Metadata) -> (u32, u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        (_md.uid(), _md.gid())
    }
    #[cfg(not(unix))]
    {
        (0, 0)
    }
}
