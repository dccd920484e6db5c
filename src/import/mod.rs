//! Subscription import from Takeout exports.
//!
//! An export arrives as JSON, as CSV, or as the ZIP archive Takeout hands
//! out with the CSV inside it. [`SubscriptionExtractor`] picks the parser
//! from a declared content type and returns the subscriptions found.
//!
//! - [`json`] - `[].snippet.resourceId.channelId` records
//! - [`csv`] - `id,url,title` lines
//! - [`archive`] - locating the CSV inside a ZIP archive

pub mod archive;
pub mod csv;
mod item;
pub mod json;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

pub use archive::{KNOWN_ARCHIVE_PATHS, is_known_archive_path};
pub use item::SubscriptionItem;

use crate::error::{ImportError, Result};

/// Prefix of a channel URL; the 24-character channel id follows it.
pub const BASE_CHANNEL_URL: &str = "https://www.youtube.com/channel/";

/// Where a user requests the export this module reads.
pub const RELATED_URL: &str = "https://takeout.google.com/takeout/custom/youtube";

/// Container format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Csv,
    Zip,
}

impl ContentType {
    /// Guess the format from a file name's extension, ignoring case.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ContentType::Json),
            "csv" => Some(ContentType::Csv),
            "zip" => Some(ContentType::Zip),
            _ => None,
        }
    }

    /// Canonical token for this format, accepted back by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Csv => "csv",
            ContentType::Zip => "zip",
        }
    }
}

impl FromStr for ContentType {
    type Err = ImportError;

    /// Tokens are matched exactly, including case.
    fn from_str(token: &str) -> Result<Self> {
        match token {
            "json" | "application/json" => Ok(ContentType::Json),
            "csv" | "text/csv" | "text/comma-separated-values" => Ok(ContentType::Csv),
            "zip" | "application/zip" => Ok(ContentType::Zip),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads subscription lists out of Takeout exports for one service.
///
/// Holds no state between calls; every call parses its own stream into a
/// fresh list.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionExtractor {
    service_id: i32,
}

impl SubscriptionExtractor {
    pub fn new(service_id: i32) -> Self {
        Self { service_id }
    }

    pub fn service_id(&self) -> i32 {
        self.service_id
    }

    /// Page where the user can request the export.
    pub fn related_url(&self) -> &'static str {
        RELATED_URL
    }

    /// Parse an export of the given content type.
    ///
    /// Without a declared type the export is read as JSON, the format of
    /// older exports.
    ///
    /// # Errors
    ///
    /// [`ImportError::UnsupportedFormat`] for an unrecognised token, or
    /// whatever the selected parser reports.
    pub fn extract<R: Read>(
        &self,
        reader: R,
        content_type: Option<&str>,
    ) -> Result<Vec<SubscriptionItem>> {
        let content_type = match content_type {
            Some(token) => token.parse()?,
            None => ContentType::Json,
        };
        self.parse(reader, content_type)
    }

    /// Parse an export whose format is already known.
    pub fn parse<R: Read>(
        &self,
        reader: R,
        content_type: ContentType,
    ) -> Result<Vec<SubscriptionItem>> {
        tracing::debug!(%content_type, service_id = self.service_id, "Importing subscriptions");

        let result = match content_type {
            ContentType::Json => json::parse_json(reader, self.service_id),
            ContentType::Csv => csv::parse_csv(reader, self.service_id),
            ContentType::Zip => archive::parse_zip(reader, self.service_id),
        };

        if let Err(e) = &result {
            tracing::warn!(%content_type, error = %e, "Subscription import failed");
        }
        result
    }
}
