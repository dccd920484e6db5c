//! CSV subscription exports.
//!
//! Takeout writes `Channel Id,Channel Url,Channel Title` with no quoting.
//! Lines are split on the first two commas only, so a title keeps any
//! commas it contains. Quoted fields are deliberately not interpreted.
//! A line ends at `\n`, `\r` or `\r\n`.

use std::io::{self, BufRead, BufReader, Read};

use super::SubscriptionItem;
use crate::error::{ImportError, Result};

/// Parse a header-prefixed CSV subscription list.
///
/// The first line is discarded. Each following line yields one item whose
/// URL is the second column and whose title is everything after the second
/// comma. Lines with fewer than two commas are skipped. An input with no
/// data lines (or no lines at all) gives an empty list.
///
/// # Errors
///
/// Returns [`ImportError::MalformedInput`] if reading fails or the text is
/// not valid UTF-8.
pub fn parse_csv<R: Read>(reader: R, service_id: i32) -> Result<Vec<SubscriptionItem>> {
    let mut lines = Lines::new(BufReader::new(reader));

    // Header
    if let Some(header) = lines.next() {
        header.map_err(|e| ImportError::malformed_from("Error reading CSV file", e))?;
    }

    let mut items = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        let line = line.map_err(|e| ImportError::malformed_from("Error reading CSV file", e))?;

        match split_line(&line) {
            Some((url, title)) => items.push(SubscriptionItem::new(service_id, url, title)),
            None => {
                tracing::debug!(line = %line, "Skipping CSV line without two delimiters");
                skipped += 1;
            }
        }
    }

    tracing::info!(
        imported = items.len(),
        skipped,
        "Parsed CSV subscription export"
    );
    Ok(items)
}

/// Line iterator that accepts `\n`, `\r` and `\r\n` terminators.
struct Lines<B> {
    reader: B,
    /// The previous line ended in `\r`, so a leading `\n` belongs to it.
    skip_lf: bool,
}

impl<B: BufRead> Lines<B> {
    fn new(reader: B) -> Self {
        Self {
            reader,
            skip_lf: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        let mut partial = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }

            let mut start = 0;
            if self.skip_lf {
                self.skip_lf = false;
                if buf[0] == b'\n' {
                    start = 1;
                }
            }

            match buf[start..].iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    let end = start + i;
                    line.extend_from_slice(&buf[start..end]);
                    self.skip_lf = buf[end] == b'\r';
                    self.reader.consume(end + 1);
                    return decode(line).map(Some);
                }
                None => {
                    let len = buf.len();
                    line.extend_from_slice(&buf[start..]);
                    partial |= len > start;
                    self.reader.consume(len);
                }
            }
        }

        if partial {
            decode(line).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<B: BufRead> Iterator for Lines<B> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

fn decode(line: Vec<u8>) -> io::Result<String> {
    String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Split a data line into (channel url, channel title).
fn split_line(line: &str) -> Option<(&str, &str)> {
    let (_, rest) = line.split_once(',')?;
    rest.split_once(',')
}
