//! Header-driven column lookup for the listing table.

/// Column positions of the record fields within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: usize,
    pub author: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMap {
    /// Layout used when the table has no recognizable header: title,
    /// author, category in that order.
    pub const POSITIONAL: ColumnMap = ColumnMap {
        title: 0,
        author: Some(1),
        category: Some(2),
    };

    /// Map columns by case-insensitive substring of the header text.
    /// `None` unless some header mentions "title".
    pub fn from_headers(headers: &[String]) -> Option<Self> {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let find = |needle: &str| lowered.iter().position(|h| h.contains(needle));
        Some(ColumnMap {
            title: find("title")?,
            author: find("author"),
            category: find("category"),
        })
    }
}
