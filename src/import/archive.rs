//! Takeout ZIP archives.
//!
//! The subscriptions CSV sits at a fixed, localised path inside the
//! archive. The archive is walked once, front to back, and the first
//! entry at a known path is parsed as CSV straight out of the
//! decompressor.

use std::io::Read;

use super::SubscriptionItem;
use super::csv::parse_csv;
use crate::error::{ImportError, Result};
use crate::zip::ZipStreamParser;

/// Where Takeout puts the subscriptions CSV, per export language.
pub const KNOWN_ARCHIVE_PATHS: [&str; 2] = [
    "Takeout/YouTube and YouTube Music/subscriptions/subscriptions.csv",
    "Takeout/YouTube y YouTube Music/suscripciones/suscripciones.csv",
];

/// Whether `entry_name` is one of [`KNOWN_ARCHIVE_PATHS`], ignoring case.
///
/// Case is folded with Unicode lowercase mappings, which do not depend on
/// the process locale.
pub fn is_known_archive_path(entry_name: &str) -> bool {
    KNOWN_ARCHIVE_PATHS
        .iter()
        .any(|known| eq_ignore_case(known, entry_name))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Find the subscriptions CSV in a Takeout ZIP archive and parse it.
///
/// Only the first entry at a known path is consulted.
///
/// # Errors
///
/// - [`ImportError::MalformedInput`] if the archive cannot be read, or the
///   matching entry is not a readable CSV (the message names the entry)
/// - [`ImportError::SubscriptionFileNotFound`] if no entry matched
pub fn parse_zip<R: Read>(reader: R, service_id: i32) -> Result<Vec<SubscriptionItem>> {
    let mut parser = ZipStreamParser::new(reader);

    loop {
        let entry_name = match parser.next_entry() {
            Ok(Some(header)) => header.file_name.clone(),
            Ok(None) => break,
            Err(e) => {
                return Err(ImportError::malformed_from(
                    "Error reading contents of zip file",
                    e,
                ));
            }
        };

        if !is_known_archive_path(&entry_name) {
            tracing::debug!(entry = %entry_name, "Skipping archive entry");
            continue;
        }

        tracing::debug!(entry = %entry_name, "Found subscriptions file in archive");
        return parse_csv(&mut parser, service_id).map_err(|e| {
            ImportError::malformed_from(
                format!("Error reading contents of file '{}'", entry_name),
                e,
            )
        });
    }

    Err(ImportError::SubscriptionFileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths_match_in_any_case() {
        assert!(is_known_archive_path(
            "Takeout/YouTube and YouTube Music/subscriptions/subscriptions.csv"
        ));
        assert!(is_known_archive_path(
            "TAKEOUT/youtube AND youtube music/SUBSCRIPTIONS/Subscriptions.CSV"
        ));
        assert!(is_known_archive_path(
            "takeout/youtube y youtube music/suscripciones/suscripciones.csv"
        ));
    }

    #[test]
    fn other_paths_do_not_match() {
        assert!(!is_known_archive_path("subscriptions.csv"));
        assert!(!is_known_archive_path(
            "Takeout/YouTube and YouTube Music/subscriptions/"
        ));
        assert!(!is_known_archive_path(
            "/Takeout/YouTube and YouTube Music/subscriptions/subscriptions.csv"
        ));
        assert!(!is_known_archive_path(
            "Takeout/YouTube und YouTube Music/Abos/Abos.csv"
        ));
    }

    #[test]
    fn case_fold_is_not_ascii_only() {
        assert!(eq_ignore_case("ÉTÉ", "été"));
        assert!(!eq_ignore_case("été", "ete"));
    }

    #[test]
    fn non_zip_input_is_malformed() {
        let err = parse_zip(&b"Channel Id,Channel Url,Channel Title\n"[..], 0).unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput { .. }));
    }

    #[test]
    fn empty_input_has_no_subscriptions_file() {
        let err = parse_zip(&b""[..], 0).unwrap_err();
        assert!(matches!(err, ImportError::SubscriptionFileNotFound));
    }
}
