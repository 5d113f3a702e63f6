//! Attachment discovery on project detail pages.
//!
//! A detail page lists its files in a table headed "Attachment"; every link
//! in that table's data cells is one downloadable file.

use crate::listing::{normalize_ws, read_tables, resolve_link};
use crate::naming::filename_from_url_path;
use scraper::Html;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Display name; the link text, or the URL's last path segment when the text is empty.
    pub name: String,
    pub url: Url,
}

/// Attachments listed on a detail page, in document order, without
/// duplicate URLs. Relative links resolve against `page_url`.
pub fn resolve_attachments(html: &str, page_url: &Url) -> Vec<Attachment> {
    let doc = Html::parse_document(html);
    let Some(table) = read_tables(&doc).into_iter().find(|t| {
        t.headers
            .iter()
            .any(|h| normalize_ws(h).eq_ignore_ascii_case("attachment"))
    }) else {
        return Vec::new();
    };

    let mut out: Vec<Attachment> = Vec::new();
    for link in table.rows.iter().flat_map(|r| &r.cells).flat_map(|c| &c.links) {
        let url = match resolve_link(page_url, &link.href) {
            Ok(url) => url,
            Err(reason) => {
                tracing::warn!("skipping attachment link: {}", reason);
                continue;
            }
        };
        if out.iter().any(|a| a.url == url) {
            continue;
        }
        let name = if link.text.is_empty() {
            filename_from_url_path(url.as_str()).unwrap_or_default()
        } else {
            link.text.clone()
        };
        out.push(Attachment { name, url });
    }
    out
}
