//! Single-attempt HTTP GET of record payloads.
//!
//! The orchestrator only sees the [`Transport`] trait; [`CurlTransport`] is
//! the libcurl implementation used by the CLI.

mod curl_transport;

pub use curl_transport::CurlTransport;

use crate::error::{Error, Result};
use crate::record::ListingRecord;
use std::fmt;

/// Why a GET did not produce a body.
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, DNS, ...).
    Curl(curl::Error),
    /// The server answered outside 2xx.
    Http(u32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

impl TransportError {
    pub fn status(&self) -> Option<u32> {
        match self {
            TransportError::Http(code) => Some(*code),
            _ => None,
        }
    }
}

/// Blocking HTTP GET returning the full response body.
///
/// Implementations follow redirects and treat any final status outside
/// 2xx as [`TransportError::Http`].
pub trait Transport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// GET `url` on behalf of the item titled `title`, mapping failures to [`Error::Fetch`].
pub fn get_for(transport: &dyn Transport, title: &str, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("GET {}", url);
    transport.get(url).map_err(|e| Error::Fetch {
        title: title.to_string(),
        url: url.to_string(),
        status: e.status(),
        reason: e.to_string(),
    })
}

/// Download a record's payload from its `download_url`.
pub fn fetch(transport: &dyn Transport, record: &ListingRecord) -> Result<Vec<u8>> {
    let body = get_for(transport, &record.title, record.download_url.as_str())?;
    tracing::debug!(
        "fetched {} byte(s) for '{}'",
        body.len(),
        record.title
    );
    Ok(body)
}
