use std::io::{self, Write};
use std::path::PathBuf;

use adz_core::error::Result;
use adz_core::{CreateOptions, ExtractOptions, create, extract, list, verify};

pub fn handle_create(archive: PathBuf, input: PathBuf, deterministic: bool) -> Result<()> {
    let opts = CreateOptions {
        deterministic_ids: deterministic,
    };
    let n = create(&input, &archive, Some(&opts))?;
    eprintln!("create: {} -> {} ({n} entries)", input.display(), archive.display());
    Ok(())
}

pub fn handle_list(archive: PathBuf, long: bool) -> Result<()> {
    let listing = list(&archive)?;
    let mut out = io::stdout().lock();
    writeln!(out, "Archive: {}", archive.display())?;
    for row in listing {
        let row = row?;
        let indent = "  ".repeat(row.depth);
        let slash = if row.is_dir() { "/" } else { "" };
        if long {
            writeln!(
                out,
                "{:>7o} {:>6} {:>6} {:>10}  {indent}{}{slash}",
                row.mode, row.owner, row.group, row.size, row.path
            )?;
        } else {
            writeln!(out, "{indent}{}{slash}", row.path)?;
        }
    }
    Ok(())
}

pub fn handle_extract(
    archive: PathBuf,
    dest: PathBuf,
    preserve_permissions: bool,
    preserve_owner: bool,
) -> Result<()> {
    let opts = ExtractOptions {
        restore_permissions: preserve_permissions,
        restore_ownership: preserve_owner,
    };
    extract(&archive, &dest, Some(&opts))?;
    eprintln!("extract: {} -> {}", archive.display(), dest.display());
    Ok(())
}

pub fn handle_verify(archive: PathBuf, json: bool) -> Result<()> {
    let summary = verify(&archive)?;
    if json {
        let text = serde_json::to_string_pretty(&summary).map_err(io::Error::other)?;
        println!("{text}");
    } else {
        println!(
            "entries={} dirs={} files={} content_bytes={} metadata_offset={} archive_len={}",
            summary.entry_count,
            summary.dirs,
            summary.files,
            summary.content_bytes,
            summary.metadata_offset,
            summary.archive_len
        );
    }
    eprintln!("verify: OK");
    Ok(())
}
