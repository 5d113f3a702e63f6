//! Typed intermediate form of HTML tables.
//!
//! Field extraction never touches the DOM directly; it works on these
//! structs so listing and detail-page parsing share one traversal.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Raw `href`, entities decoded, not yet resolved.
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub links: Vec<RawLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Position of the `<tr>` among all rows of its table, header included.
    pub index: usize,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Text of the first all-`<th>` row; empty when the table has none.
    pub headers: Vec<String>,
    /// Rows containing at least one `<td>`.
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn has_linked_cell(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.cells.iter().any(|c| !c.links.is_empty()))
    }
}

/// Collapse runs of whitespace to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every `<table>` in document order. Rows of nested tables belong only to
/// the innermost table.
pub fn read_tables(doc: &Html) -> Vec<RawTable> {
    doc.select(&TABLE).map(read_table).collect()
}

fn read_table(table: ElementRef<'_>) -> RawTable {
    let mut out = RawTable::default();

    let own_rows = table
        .select(&ROW)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(table.id()));

    for (index, row) in own_rows.enumerate() {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let all_header = cells.iter().all(|c| c.value().name() == "th");
        if all_header {
            if out.headers.is_empty() && out.rows.is_empty() {
                out.headers = cells.iter().map(|c| cell_text(*c)).collect();
            }
            continue;
        }

        out.rows.push(RawRow {
            index,
            cells: cells.into_iter().map(read_cell).collect(),
        });
    }
    out
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_ws(&cell.text().collect::<String>())
}

fn read_cell(cell: ElementRef<'_>) -> RawCell {
    let links = cell
        .select(&LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some(RawLink {
                href: href.to_string(),
                text: cell_text(a),
            })
        })
        .collect();
    RawCell {
        text: cell_text(cell),
        links,
    }
}
