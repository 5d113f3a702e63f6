//! Listing parser: pre-downloaded HTML listing → ordered, deduplicated records.
//!
//! The document is first read into [`RawTable`]s, then each data row of the
//! chosen table goes through typed field extraction. Rows that cannot yield
//! a record are skipped with a warning; only a document with no usable table
//! at all is an error.

mod columns;
pub(crate) mod table;

pub use columns::ColumnMap;
pub use table::{normalize_ws, read_tables, RawCell, RawLink, RawRow, RawTable};

use crate::error::{Error, Result};
use crate::naming::{derive_filename, FilenameAllocator};
use crate::record::{download_url_for, ListingRecord};
use scraper::Html;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

/// Parse the listing file at `path`.
///
/// Relative detail links resolve against `base`; each download URL is the
/// detail URL with `download_endpoint` appended.
pub fn parse(path: &Path, base: &Url, download_endpoint: &str) -> Result<Vec<ListingRecord>> {
    let bytes = fs::read(path).map_err(|e| Error::Parse {
        origin: path.display().to_string(),
        reason: format!("read failed: {e}"),
    })?;
    parse_markup(&bytes, &path.display().to_string(), base, download_endpoint)
}

/// Parse listing markup obtained from `origin` (a path or URL, used in errors and logs).
pub fn parse_markup(
    bytes: &[u8],
    origin: &str,
    base: &Url,
    download_endpoint: &str,
) -> Result<Vec<ListingRecord>> {
    let html = String::from_utf8_lossy(bytes);
    let records = parse_str(&html, base, download_endpoint).ok_or_else(|| Error::Parse {
        origin: origin.to_string(),
        reason: "no listing table found (expected a <table> with a title column or linked rows)"
            .to_string(),
    })?;
    tracing::info!("parsed {} record(s) from {}", records.len(), origin);
    Ok(records)
}

/// Parse listing markup. `None` when the document has no listing table.
pub fn parse_str(html: &str, base: &Url, download_endpoint: &str) -> Option<Vec<ListingRecord>> {
    let doc = Html::parse_document(html);
    let (table, columns) = select_listing_table(read_tables(&doc))?;

    let mut seen = HashSet::new();
    let mut names = FilenameAllocator::reserving_extraction_dirs();
    let mut records = Vec::new();

    for row in &table.rows {
        let fields = match extract_row(row, columns, base, download_endpoint) {
            Ok(fields) => fields,
            Err(reason) => {
                tracing::warn!(row = row.index, "skipping listing row: {}", reason);
                continue;
            }
        };
        if !seen.insert(fields.detail_url.as_str().to_string()) {
            tracing::debug!(
                row = row.index,
                "duplicate detail URL {}, keeping first",
                fields.detail_url
            );
            continue;
        }
        let filename = names.allocate(&derive_filename(&fields.title, fields.download_url.as_str()));
        records.push(ListingRecord {
            title: fields.title,
            author: fields.author,
            category: fields.category,
            detail_url: fields.detail_url,
            download_url: fields.download_url,
            filename,
        });
    }
    Some(records)
}

/// First table with a title header; otherwise the first table whose data
/// rows carry links, read positionally.
fn select_listing_table(tables: Vec<RawTable>) -> Option<(RawTable, ColumnMap)> {
    let mut fallback = None;
    for table in tables {
        if let Some(columns) = ColumnMap::from_headers(&table.headers) {
            return Some((table, columns));
        }
        if fallback.is_none() && table.has_linked_cell() {
            fallback = Some(table);
        }
    }
    fallback.map(|t| (t, ColumnMap::POSITIONAL))
}

struct RowFields {
    title: String,
    author: String,
    category: String,
    detail_url: Url,
    download_url: Url,
}

fn extract_row(
    row: &RawRow,
    columns: ColumnMap,
    base: &Url,
    download_endpoint: &str,
) -> std::result::Result<RowFields, String> {
    let text_at = |idx: Option<usize>| {
        idx.and_then(|i| row.cells.get(i))
            .map(|c| c.text.clone())
            .unwrap_or_default()
    };

    let title_cell = row
        .cells
        .get(columns.title)
        .ok_or_else(|| format!("row has no column {}", columns.title))?;
    if title_cell.text.is_empty() {
        return Err("empty title".to_string());
    }

    let link = title_cell
        .links
        .first()
        .or_else(|| row.cells.iter().find_map(|c| c.links.first()))
        .ok_or_else(|| format!("no detail link for '{}'", title_cell.text))?;

    let detail_url = resolve_link(base, &link.href)?;
    let download_url = download_url_for(&detail_url, download_endpoint)
        .ok_or_else(|| format!("cannot derive download URL from {detail_url}"))?;

    Ok(RowFields {
        title: title_cell.text.clone(),
        author: text_at(columns.author),
        category: text_at(columns.category),
        detail_url,
        download_url,
    })
}

/// Resolve `href` against `base`; only http(s) targets are accepted.
pub(crate) fn resolve_link(base: &Url, href: &str) -> std::result::Result<Url, String> {
    let mut url = base
        .join(href)
        .map_err(|e| format!("bad link {href:?}: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported link scheme in {href:?}"));
    }
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base() -> Url {
        Url::parse("http://obex.parallax.com").unwrap()
    }

    const LISTING: &str = r#"
        <html><body>
        <table class="nav"><tr><td>Menu</td></tr></table>
        <table class="views-table">
          <thead><tr>
            <th>Project Title</th><th>Category</th><th>Author</th>
          </tr></thead>
          <tbody>
            <tr><td><a href="/projects/servo">Servo  Driver</a></td><td>Motor Control</td><td>Jane</td></tr>
            <tr><td><a href="/projects/pwm/">PWM, 32 channel</a></td><td>Motor Control</td><td></td></tr>
            <tr><td><a href="/projects/servo">Servo Driver (page 2 copy)</a></td><td>Motor Control</td><td>Jane</td></tr>
            <tr><td></td><td>Misc</td><td>Nobody</td></tr>
            <tr><td><a href="http://other.example.com/projects/vga">VGA</a></td><td>Display</td><td>Chip</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn parses_dedups_and_preserves_order() {
        let records = parse_str(LISTING, &base(), "download").unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Servo Driver", "PWM, 32 channel", "VGA"]);

        let servo = &records[0];
        assert_eq!(servo.author, "Jane");
        assert_eq!(servo.category, "Motor Control");
        assert_eq!(servo.detail_url.as_str(), "http://obex.parallax.com/projects/servo");
        assert_eq!(
            servo.download_url.as_str(),
            "http://obex.parallax.com/projects/servo/download"
        );
        assert_eq!(servo.filename, "Servo_Driver");

        assert_eq!(records[1].author, "");
        assert_eq!(records[1].filename, "PWM,_32_channel");
        assert_eq!(
            records[2].detail_url.as_str(),
            "http://other.example.com/projects/vga"
        );
    }

    #[test]
    fn duplicate_titles_get_distinct_filenames() {
        let html = r#"<table>
            <tr><th>Title</th></tr>
            <tr><td><a href="/p/1">Driver</a></td></tr>
            <tr><td><a href="/p/2">Driver</a></td></tr>
        </table>"#;
        let records = parse_str(html, &base(), "download").unwrap();
        assert_eq!(records[0].filename, "Driver");
        assert_eq!(records[1].filename, "Driver-2");
    }

    #[test]
    fn headerless_table_read_positionally() {
        let html = r#"<table>
            <tr><td><a href="/p/a">A</a></td><td>Ann</td><td>Tools</td></tr>
        </table>"#;
        let records = parse_str(html, &base(), "download").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author, "Ann");
        assert_eq!(records[0].category, "Tools");
    }

    #[test]
    fn link_outside_title_cell_is_used() {
        let html = r#"<table>
            <tr><th>Title</th><th>Link</th></tr>
            <tr><td>Keypad</td><td><a href="/p/keypad">details</a></td></tr>
        </table>"#;
        let records = parse_str(html, &base(), "download").unwrap();
        assert_eq!(records[0].title, "Keypad");
        assert_eq!(records[0].detail_url.as_str(), "http://obex.parallax.com/p/keypad");
    }

    #[test]
    fn rows_without_links_or_with_bad_schemes_are_skipped() {
        let html = r#"<table>
            <tr><th>Title</th></tr>
            <tr><td>No link here</td></tr>
            <tr><td><a href="mailto:x@y.z">Mail</a></td></tr>
            <tr><td><a href="/p/ok">Ok</a></td></tr>
        </table>"#;
        let records = parse_str(html, &base(), "download").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Ok");
    }

    #[test]
    fn header_only_table_yields_empty_listing() {
        let html = "<table><tr><th>Project Title</th></tr></table>";
        assert_eq!(parse_str(html, &base(), "download").unwrap().len(), 0);
    }

    #[test]
    fn missing_structure_is_none() {
        assert!(parse_str("<html><p>Access denied</p></html>", &base(), "download").is_none());
        assert!(parse_str("<table><tr><td>plain</td></tr></table>", &base(), "download").is_none());
    }

    #[test]
    fn parse_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("obex.html");
        match parse(&missing, &base(), "download") {
            Err(Error::Parse { origin, .. }) => {
                assert_eq!(origin, missing.display().to_string())
            }
            other => panic!("expected Parse error, got {other:?}"),
        }

        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"<html><body>wrong file</body></html>").unwrap();
        f.flush().unwrap();
        assert!(matches!(
            parse(f.path(), &base(), "download"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn parse_file_ok() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(LISTING.as_bytes()).unwrap();
        f.flush().unwrap();
        let records = parse(f.path(), &base(), "download").unwrap();
        assert_eq!(records.len(), 3);
    }
}
