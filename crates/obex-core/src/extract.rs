//! Zip extraction of downloaded payloads.
//!
//! Archives are recognized by their local-file-header magic, since direct
//! downloads are saved without an extension. Each archive unpacks into a
//! sibling directory; archives that appear inside extracted content are
//! unpacked in turn until no new archive is found.

use crate::naming::extraction_dir_name;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// True if the file starts with a zip local file header.
pub fn is_zip(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| magic == ZIP_MAGIC)
        .unwrap_or(false)
}

/// Directory an archive unpacks into: `x.zip` → `x`, `x` → `x_files`.
pub fn extraction_dir(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    archive.with_file_name(extraction_dir_name(&name))
}

/// Extract one archive into `dest`. Returns the number of files written.
/// Entries whose names escape `dest` are skipped.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file =
        File::open(archive_path).with_context(|| format!("open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("read zip {}", archive_path.display()))?;
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("read entry {} of {}", i, archive_path.display()))?;
        let Some(rel) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!(
                "skipping entry with unsafe path {:?} in {}",
                entry.name(),
                archive_path.display()
            );
            continue;
        };
        let out_path = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let mut out =
            File::create(&out_path).with_context(|| format!("create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out).with_context(|| format!("write {}", out_path.display()))?;
        written += 1;
    }
    tracing::debug!(
        "extracted {} file(s) from {} into {}",
        written,
        archive_path.display(),
        dest.display()
    );
    Ok(written)
}

/// Extract every archive under `root` (or `root` itself when it is a file).
/// Each extraction directory is scanned in turn, so archives inside archives
/// are unpacked until nothing new turns up.
///
/// Returns one message per archive that failed; those do not stop the others.
pub fn extract_all(root: &Path) -> Vec<String> {
    let mut done: HashSet<PathBuf> = HashSet::new();
    let mut failures = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for archive in find_archives(&dir) {
            if !done.insert(archive.clone()) {
                continue;
            }
            let dest = extraction_dir(&archive);
            match extract_zip(&archive, &dest) {
                Ok(_) => pending.push(dest),
                Err(e) => {
                    tracing::warn!("extraction failed: {:#}", e);
                    failures.push(format!("{:#}", e));
                }
            }
        }
    }
    failures
}

fn find_archives(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        if path.is_dir() {
            if let Ok(entries) = fs::read_dir(&path) {
                let mut children: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
                children.sort();
                stack.extend(children.into_iter().rev());
            }
        } else if is_zip(&path) {
            out.push(path);
        }
    }
    out
}
