use adz_core::{AdzError, create, extract, list, verify};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 533;
const SIZE_AT: usize = 525;
const OFFSET_AT: usize = 529;

/// root/{a.txt="abcd", sub/{b.txt="xy"}} archived; records are
/// 0=root, 1=a.txt, 2=sub, 3=b.txt and the table starts at 18.
fn archived() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"abcd").unwrap();
    fs::write(root.join("sub/b.txt"), b"xy").unwrap();
    let archive = dir.path().join("s.adz");
    create(&root, &archive, None).unwrap();
    (dir, archive)
}

fn patch_u32(archive: &Path, at: usize, value: u32) {
    let mut bytes = fs::read(archive).unwrap();
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    fs::write(archive, bytes).unwrap();
}

fn field(record: usize, off: usize) -> usize {
    18 + record * RECORD_LEN + off
}

fn list_err(archive: &Path) -> AdzError {
    match list(archive) {
        Err(e) => e,
        Ok(rows) => rows
            .filter_map(Result::err)
            .next()
            .expect("listing should fail"),
    }
}

#[test]
fn foreign_file_is_invalid_format() {
    let dir = tempdir().unwrap();
    let bogus = dir.path().join("bogus.adz");
    fs::write(&bogus, b"PK\x03\x04 definitely not ours").unwrap();

    assert!(matches!(list(&bogus), Err(AdzError::InvalidFormat(_))));
    assert!(matches!(verify(&bogus), Err(AdzError::InvalidFormat(_))));
    let out = dir.path().join("out");
    assert!(matches!(
        extract(&bogus, &out, None),
        Err(AdzError::InvalidFormat(_))
    ));
    assert!(!out.exists());
}

#[test]
fn tiny_file_is_invalid_format() {
    let dir = tempdir().unwrap();
    let tiny = dir.path().join("tiny.adz");
    fs::write(&tiny, [0xAD, 0xAD]).unwrap();
    assert!(matches!(list(&tiny), Err(AdzError::InvalidFormat(_))));
}

#[test]
fn inflated_directory_count_is_detected() {
    let (_dir, archive) = archived();
    patch_u32(&archive, field(2, SIZE_AT), 5);
    assert!(matches!(list_err(&archive), AdzError::CorruptArchive(_)));
}

#[test]
fn deflated_root_count_is_detected() {
    let (_dir, archive) = archived();
    patch_u32(&archive, field(0, SIZE_AT), 2);
    assert!(matches!(list_err(&archive), AdzError::CorruptArchive(_)));
}

#[test]
fn entry_count_past_eof_is_detected() {
    let (_dir, archive) = archived();
    patch_u32(&archive, 4, 5);
    assert!(matches!(list(&archive), Err(AdzError::CorruptArchive(_))));
}

#[test]
fn metadata_offset_inside_header_is_detected() {
    let (_dir, archive) = archived();
    patch_u32(&archive, 8, 4);
    assert!(matches!(list(&archive), Err(AdzError::CorruptArchive(_))));
}

#[test]
fn content_past_region_stops_extract() {
    let (dir, archive) = archived();
    // b.txt: 2 bytes at 17 would end at 19, past the table start at 18
    patch_u32(&archive, field(3, OFFSET_AT), 17);

    let out = dir.path().join("out");
    let err = extract(&archive, &out, None).unwrap_err();
    assert!(matches!(err, AdzError::CorruptArchive(_)));
    // entries before the failure stay on disk
    assert_eq!(fs::read(out.join("root/a.txt")).unwrap(), b"abcd");
    assert!(!out.join("root/sub/b.txt").exists());
}

#[test]
fn overlapping_content_fails_verify_only() {
    let (_dir, archive) = archived();
    patch_u32(&archive, field(3, OFFSET_AT), 14);
    // still within the region, so a plain listing is fine
    assert_eq!(list(&archive).unwrap().filter(Result::is_ok).count(), 4);
    assert!(matches!(verify(&archive), Err(AdzError::CorruptArchive(_))));
}

#[test]
fn trailing_bytes_fail_verify() {
    let (_dir, archive) = archived();
    let mut bytes = fs::read(&archive).unwrap();
    bytes.extend_from_slice(b"junk");
    fs::write(&archive, bytes).unwrap();
    assert!(matches!(verify(&archive), Err(AdzError::CorruptArchive(_))));
}

#[test]
fn misplaced_path_fails_verify() {
    let (_dir, archive) = archived();
    let mut bytes = fs::read(&archive).unwrap();
    let at = field(3, 257);
    bytes[at..at + 14].copy_from_slice(b"root/xxx/b.txt");
    fs::write(&archive, bytes).unwrap();
    assert!(matches!(verify(&archive), Err(AdzError::CorruptArchive(_))));
}

#[test]
fn escaping_path_is_refused_by_extract() {
    let (dir, archive) = archived();
    let mut bytes = fs::read(&archive).unwrap();
    let at = field(1, 257);
    let evil = b"../evil.txt\0";
    bytes[at..at + evil.len()].copy_from_slice(evil);
    fs::write(&archive, bytes).unwrap();

    let out = dir.path().join("out");
    let err = extract(&archive, &out, None).unwrap_err();
    assert!(matches!(err, AdzError::CorruptArchive(_)));
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn unfinished_header_is_rejected() {
    let (_dir, archive) = archived();
    let mut bytes = fs::read(&archive).unwrap();
    bytes[..HEADER_LEN].fill(0);
    fs::write(&archive, bytes).unwrap();
    assert!(matches!(list(&archive), Err(AdzError::InvalidFormat(_))));
}
