//! The parsed listing entry and its derived download location.

use url::Url;

/// One project discovered in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub title: String,
    /// Empty when the listing has no author column or the cell is blank.
    pub author: String,
    pub category: String,
    pub detail_url: Url,
    pub download_url: Url,
    /// Unique within the output directory.
    pub filename: String,
}

/// Download URL for a detail page: `endpoint` appended as path segment(s),
/// query and fragment dropped.
///
/// `http://h/projects/servo/?x=1` + `download` → `http://h/projects/servo/download`.
/// Returns `None` for URLs that cannot carry a path (e.g. `mailto:`).
pub fn download_url_for(detail_url: &Url, endpoint: &str) -> Option<Url> {
    let mut url = detail_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        segments.extend(endpoint.split('/').filter(|s| !s.is_empty()));
    }
    Some(url)
}
