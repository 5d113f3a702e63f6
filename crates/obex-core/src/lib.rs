pub mod config;
pub mod logging;

pub mod attachments;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod listing;
pub mod naming;
pub mod record;
pub mod run;
pub mod table;

pub use error::{Error, Result};
pub use record::ListingRecord;
