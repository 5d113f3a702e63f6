//! Error taxonomy for the listing → table → download pipeline.
//!
//! `AlreadyExists`, `Parse`, `ListingFetch` and `Csv` abort a run. `Fetch`, `Write` and
//! `NoAttachments` are per-item: the orchestrator records them and moves on.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Output directory or table file is already present.
    #[error("{} already exists; refusing to overwrite", path.display())]
    AlreadyExists { path: PathBuf },

    /// Listing unreadable or not recognizable as a listing. `origin` is the
    /// file path or URL it came from.
    #[error("cannot parse listing {origin}: {reason}")]
    Parse { origin: String, reason: String },

    /// The listing page could not be downloaded.
    #[error("cannot download listing {url}: {reason}")]
    ListingFetch { url: String, reason: String },

    /// A single item could not be downloaded.
    #[error("{}", fetch_message(title, url, *status, reason))]
    Fetch {
        title: String,
        url: String,
        /// HTTP status when the server answered; `None` for transport failures.
        status: Option<u32>,
        reason: String,
    },

    /// Local filesystem write failed.
    #[error("cannot write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table serialization failed.
    #[error("cannot write table {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Detail page had no attachment table or it listed no links.
    #[error("no attachments found for '{title}' at {url}")]
    NoAttachments { title: String, url: String },
}

fn fetch_message(title: &str, url: &str, status: Option<u32>, reason: &str) -> String {
    match status {
        Some(code) => format!("GET {url} for '{title}' returned HTTP {code}"),
        None => format!("GET {url} for '{title}' failed: {reason}"),
    }
}

impl Error {
    /// True for errors the orchestrator tolerates per item.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. } | Error::Write { .. } | Error::NoAttachments { .. }
        )
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_message_with_status() {
        let e = Error::Fetch {
            title: "Servo Driver".into(),
            url: "http://obex.parallax.com/projects/servo/download".into(),
            status: Some(404),
            reason: String::new(),
        };
        assert_eq!(
            e.to_string(),
            "GET http://obex.parallax.com/projects/servo/download for 'Servo Driver' returned HTTP 404"
        );
        assert!(e.is_item_level());
    }

    #[test]
    fn fetch_message_transport_failure() {
        let e = Error::Fetch {
            title: "x".into(),
            url: "http://127.0.0.1:1/".into(),
            status: None,
            reason: "couldn't connect".into(),
        };
        assert!(e.to_string().ends_with("failed: couldn't connect"));
    }

    #[test]
    fn fatal_errors_are_not_item_level() {
        let e = Error::AlreadyExists {
            path: PathBuf::from("/tmp/out"),
        };
        assert!(!e.is_item_level());
        assert_eq!(e.to_string(), "/tmp/out already exists; refusing to overwrite");
    }

    #[test]
    fn listing_fetch_is_fatal() {
        let e = Error::ListingFetch {
            url: "http://obex.parallax.com/projects/".into(),
            reason: "HTTP 503".into(),
        };
        assert!(!e.is_item_level());
        assert_eq!(
            e.to_string(),
            "cannot download listing http://obex.parallax.com/projects/: HTTP 503"
        );
    }
}
