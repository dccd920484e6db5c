//! # takeout-import
//!
//! Import a user's channel subscriptions from a Takeout data export.
//!
//! An export is accepted in any of the forms Takeout produces: the JSON
//! subscription list, the CSV subscription list, or the ZIP archive that
//! contains the CSV. Archives are read in one forward pass straight from
//! the input stream, so nothing needs to be extracted to disk first.
//!
//! ## Features
//!
//! - Format selection from a content-type token (`json`, `text/csv`, `application/zip`, ...)
//! - Tolerates malformed records in JSON exports, failing only if none are usable
//! - Finds the CSV in English and Spanish archive layouts
//! - Streaming ZIP reader supporting STORED, DEFLATE and data descriptors
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//! use takeout_import::SubscriptionExtractor;
//!
//! fn main() -> anyhow::Result<()> {
//!     let file = File::open("takeout-20240101T000000Z-001.zip")?;
//!
//!     let extractor = SubscriptionExtractor::new(0);
//!     for item in extractor.extract(file, Some("application/zip"))? {
//!         println!("{}\t{}", item.url, item.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod import;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::ImportError;
pub use import::{ContentType, SubscriptionExtractor, SubscriptionItem};
pub use crate::io::{LocalFileReader, open_input};
pub use crate::zip::{LocalFileHeader, ZipStreamParser};
