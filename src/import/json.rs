//! JSON subscription exports.
//!
//! The export is one array of subscription resources. Only
//! `snippet.resourceId.channelId` and `snippet.title` are read.

use serde_json::{Map, Value};
use std::io::{BufReader, Read};

use super::{BASE_CHANNEL_URL, SubscriptionItem};
use crate::error::{ImportError, Result};

/// Length of a channel id in UTF-16 code units, e.g. `UCsXVk37bltHxD1rDPwtNM8Q`.
pub const CHANNEL_ID_LEN: usize = 24;

/// Parse a JSON array of subscription resources.
///
/// Records that are not objects or lack a 24-character channel id are
/// dropped. If every record was dropped the input is most likely the wrong
/// file, so that case fails with [`ImportError::NoValidRecords`]. An empty
/// array is a valid export with no subscriptions.
///
/// # Errors
///
/// - [`ImportError::MalformedInput`] if the stream is not a JSON array
/// - [`ImportError::NoValidRecords`] if no record was usable
pub fn parse_json<R: Read>(reader: R, service_id: i32) -> Result<Vec<SubscriptionItem>> {
    let value: Value = serde_json::from_reader(BufReader::new(reader))
        .map_err(|e| ImportError::malformed_from("Invalid json input stream", e))?;

    let Value::Array(records) = value else {
        return Err(ImportError::malformed(
            "Invalid json input stream: expected an array",
        ));
    };

    let empty = Map::new();
    let mut invalid = 0usize;
    let mut items = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let Some(record) = record.as_object() else {
            tracing::debug!(index, "Skipping non-object subscription record");
            invalid += 1;
            continue;
        };

        let snippet = object_field(record, "snippet").unwrap_or(&empty);
        let channel_id = object_field(snippet, "resourceId")
            .and_then(|resource| string_field(resource, "channelId"))
            .unwrap_or("");

        if channel_id.encode_utf16().count() != CHANNEL_ID_LEN {
            tracing::debug!(index, channel_id, "Skipping record with invalid channel id");
            invalid += 1;
            continue;
        }

        let title = string_field(snippet, "title").unwrap_or("");
        items.push(SubscriptionItem::new(
            service_id,
            format!("{}{}", BASE_CHANNEL_URL, channel_id),
            title,
        ));
    }

    if invalid > 0 && items.is_empty() {
        return Err(ImportError::NoValidRecords);
    }

    tracing::info!(
        imported = items.len(),
        skipped = invalid,
        "Parsed JSON subscription export"
    );
    Ok(items)
}

fn object_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    object.get(key).and_then(Value::as_object)
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}
