//! CSV projection of the parsed listing.

use crate::error::{Error, Result};
use crate::record::ListingRecord;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Column order of the table file.
pub const HEADER: [&str; 4] = ["title", "author", "category", "detailUrl"];

/// Write `records` as CSV to a new file at `path`.
///
/// The file is created exclusively; an existing file yields
/// [`Error::AlreadyExists`] and is left untouched.
pub fn write_table(records: &[ListingRecord], path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Error::write(path, e),
        })?;

    write_records(records, file).map_err(|source| Error::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("wrote {} row(s) to {}", records.len(), path.display());
    Ok(())
}

/// Serialize header plus one row per record to any writer.
pub fn write_records<W: Write>(records: &[ListingRecord], w: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.write_record([
            r.title.as_str(),
            r.author.as_str(),
            r.category.as_str(),
            r.detail_url.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
