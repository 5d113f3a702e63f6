//! Downloader orchestrator: one linear batch from listing to output directory.
//!
//! Fatal: existing output paths, unavailable or unparseable listing, table
//! write failure.
//! Per item: fetch and write failures are reported and the loop moves on.

use crate::attachments::resolve_attachments;
use crate::config::{DownloadMode, ObexConfig};
use crate::error::{Error, Result};
use crate::extract;
use crate::fetch::{self, Transport};
use crate::listing;
use crate::naming::{sanitize_filename, FilenameAllocator};
use crate::record::ListingRecord;
use crate::table;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where the listing markup comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// A page saved beforehand.
    File(PathBuf),
    /// GET through the run's transport.
    Url(String),
}

/// Inputs and outputs of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub listing: ListingSource,
    /// `None` keeps the table in memory only.
    pub table: Option<PathBuf>,
    /// Must not exist yet.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub title: String,
    pub reason: String,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

impl Summary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// At least one item was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.succeeded == 0
    }
}

/// What happened to one record, reported as the loop goes.
#[derive(Debug)]
pub enum ItemEvent<'a> {
    Saved {
        record: &'a ListingRecord,
        path: &'a Path,
        files: usize,
    },
    Failed {
        record: &'a ListingRecord,
        error: &'a Error,
    },
    /// Payload saved, but unpacking one of its archives failed.
    ExtractWarning {
        record: &'a ListingRecord,
        message: &'a str,
    },
}

/// Run the whole pipeline.
///
/// `on_item` sees every per-record outcome in listing order.
pub fn run<F>(
    opts: &RunOptions,
    cfg: &ObexConfig,
    transport: &dyn Transport,
    mut on_item: F,
) -> Result<Summary>
where
    F: FnMut(ItemEvent<'_>),
{
    for path in std::iter::once(&opts.output_dir).chain(opts.table.as_ref()) {
        if path.exists() {
            return Err(Error::AlreadyExists { path: path.clone() });
        }
    }

    fs::create_dir(&opts.output_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => Error::AlreadyExists {
            path: opts.output_dir.clone(),
        },
        _ => Error::write(&opts.output_dir, e),
    })?;
    tracing::info!("created output directory {}", opts.output_dir.display());

    let records = load_listing(&opts.listing, cfg, transport)?;
    if let Some(table_path) = &opts.table {
        table::write_table(&records, table_path)?;
    }

    let mut summary = Summary::default();
    for record in &records {
        let outcome = match cfg.mode {
            DownloadMode::Direct => save_direct(transport, record, &opts.output_dir),
            DownloadMode::Attachments => save_attachments(transport, record, &opts.output_dir),
        };
        match outcome {
            Ok((path, files)) => {
                summary.succeeded += 1;
                tracing::info!("saved '{}' to {}", record.title, path.display());
                on_item(ItemEvent::Saved {
                    record,
                    path: &path,
                    files,
                });
                if cfg.extract_archives {
                    for message in extract::extract_all(&path) {
                        on_item(ItemEvent::ExtractWarning {
                            record,
                            message: &message,
                        });
                    }
                }
            }
            Err(error) => {
                summary.failed += 1;
                tracing::warn!("skipping '{}': {}", record.title, error);
                on_item(ItemEvent::Failed {
                    record,
                    error: &error,
                });
                summary.failures.push(ItemFailure {
                    title: record.title.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "batch finished: {} succeeded, {} failed",
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}

fn load_listing(
    source: &ListingSource,
    cfg: &ObexConfig,
    transport: &dyn Transport,
) -> Result<Vec<ListingRecord>> {
    let origin = match source {
        ListingSource::File(path) => path.display().to_string(),
        ListingSource::Url(url) => url.clone(),
    };
    let base = cfg.base().map_err(|e| Error::Parse {
        origin: origin.clone(),
        reason: format!("{e:#}"),
    })?;
    match source {
        ListingSource::File(path) => listing::parse(path, &base, &cfg.download_endpoint),
        ListingSource::Url(url) => {
            tracing::info!("downloading listing from {}", url);
            let bytes = transport.get(url).map_err(|e| Error::ListingFetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            listing::parse_markup(&bytes, url, &base, &cfg.download_endpoint)
        }
    }
}

/// Write `bytes` to a file that must not exist yet.
fn write_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::write(path, e))?;
    file.write_all(bytes).map_err(|e| Error::write(path, e))
}

/// GET the download URL and write the body to `output_dir/filename`.
fn save_direct(
    transport: &dyn Transport,
    record: &ListingRecord,
    output_dir: &Path,
) -> Result<(PathBuf, usize)> {
    let body = fetch::fetch(transport, record)?;
    let path = output_dir.join(&record.filename);
    write_new(&path, &body)?;
    Ok((path, 1))
}

/// GET the detail page and write each attachment into `output_dir/filename/`.
/// Fails on the first attachment that cannot be fetched or written; files
/// already written stay.
fn save_attachments(
    transport: &dyn Transport,
    record: &ListingRecord,
    output_dir: &Path,
) -> Result<(PathBuf, usize)> {
    let page = fetch::get_for(transport, &record.title, record.detail_url.as_str())?;
    let attachments = resolve_attachments(&String::from_utf8_lossy(&page), &record.detail_url);
    if attachments.is_empty() {
        return Err(Error::NoAttachments {
            title: record.title.clone(),
            url: record.detail_url.to_string(),
        });
    }

    let dir = output_dir.join(&record.filename);
    fs::create_dir(&dir).map_err(|e| Error::write(&dir, e))?;

    let mut names = FilenameAllocator::reserving_extraction_dirs();
    for attachment in &attachments {
        let body = fetch::get_for(transport, &record.title, attachment.url.as_str())?;
        let name = match sanitize_filename(&attachment.name) {
            n if n.is_empty() => "attachment".to_string(),
            n => n,
        };
        write_new(&dir.join(names.allocate(&name)), &body)?;
    }
    Ok((dir, attachments.len()))
}
