//! Forward-only ZIP archive parser.
//!
//! This module walks a ZIP archive from its first byte, one Local File
//! Header at a time, reading from any [`Read`] source.
//!
//! ## Parsing Strategy
//!
//! A ZIP file can also be read from the front:
//! 1. Read a Local File Header (LFH)
//! 2. Read (or skip) the entry's data that follows it
//! 3. If the LFH announced a data descriptor, read it after the data
//! 4. Repeat until the Central Directory or the end of the stream
//!
//! This never seeks, so it works on pipes, sockets and decompressors.
//! The price is that STORED entries must state their size up front.

use flate2::{Crc, Decompress, FlushDecompress, Status};
use std::io::{self, BufRead, BufReader, Read};

use anyhow::{Context, Result, bail};

use super::structures::*;

/// State of the entry currently positioned under the parser.
enum EntryBody {
    /// No entry, or the current one has been read to its end.
    Done,
    Stored {
        remaining: u64,
    },
    Deflate {
        inflater: Box<Decompress>,
    },
    /// Method this parser cannot decode. The entry can only be skipped.
    Unsupported {
        method: u16,
        remaining: u64,
    },
}

/// Streaming ZIP parser.
///
/// Call [`next_entry()`](Self::next_entry) to advance to an entry, then use
/// the parser itself as a [`Read`] to get that entry's uncompressed bytes.
/// Whatever is left unread is skipped on the next call to `next_entry`.
///
/// ## Example
///
/// ```ignore
/// let mut parser = ZipStreamParser::new(file);
/// while let Some(header) = parser.next_entry()? {
///     if header.file_name.ends_with(".csv") {
///         let mut text = String::new();
///         parser.read_to_string(&mut text)?;
///     }
/// }
/// ```
pub struct ZipStreamParser<R: Read> {
    /// The underlying data source
    reader: BufReader<R>,
    /// Header of the current entry, if any
    current: Option<LocalFileHeader>,
    body: EntryBody,
    /// CRC-32 of the bytes handed out for the current entry
    crc: Crc,
    /// Compressed and uncompressed bytes of the current entry seen so far
    compressed_read: u64,
    uncompressed_read: u64,
    /// Set once the central directory or end of input is reached
    finished: bool,
}

impl<R: Read> ZipStreamParser<R> {
    /// Create a new parser for the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            current: None,
            body: EntryBody::Done,
            crc: Crc::new(),
            compressed_read: 0,
            uncompressed_read: 0,
            finished: false,
        }
    }

    /// Advance to the next entry in archive order.
    ///
    /// # Returns
    ///
    /// The entry's Local File Header, or `None` once the Central Directory
    /// (or the end of the input) has been reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the remainder of the previous entry cannot be
    /// skipped, or the bytes at the current position are not a ZIP record.
    pub fn next_entry(&mut self) -> Result<Option<&LocalFileHeader>> {
        if self.finished {
            return Ok(None);
        }

        if let Some(previous) = &self.current {
            let name = previous.file_name.clone();
            self.skip_current()
                .with_context(|| format!("Failed to skip entry '{}'", name))?;
        }
        self.current = None;

        // A stream that ends cleanly between records has no more entries
        if self.reader.fill_buf()?.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        let mut sig = [0u8; 4];
        self.reader
            .read_exact(&mut sig)
            .context("Truncated ZIP record signature")?;

        if &sig == CDFH_SIGNATURE || &sig == EOCD_SIGNATURE {
            self.finished = true;
            return Ok(None);
        }
        if &sig != LFH_SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let header = LocalFileHeader::read_after_signature(&mut self.reader)
            .context("Invalid Local File Header")?;

        if header.is_encrypted() {
            bail!("Encrypted entry '{}' is not supported", header.file_name);
        }

        self.body = match header.compression_method {
            CompressionMethod::Stored if header.has_data_descriptor() => {
                bail!(
                    "STORED entry '{}' has a data descriptor and cannot be streamed",
                    header.file_name
                );
            }
            CompressionMethod::Stored => EntryBody::Stored {
                remaining: header.compressed_size,
            },
            CompressionMethod::Deflate => EntryBody::Deflate {
                inflater: Box::new(Decompress::new(false)),
            },
            CompressionMethod::Unknown(method) if header.has_data_descriptor() => {
                bail!(
                    "Entry '{}' uses compression method {} with a data descriptor",
                    header.file_name,
                    method
                );
            }
            CompressionMethod::Unknown(method) => EntryBody::Unsupported {
                method,
                remaining: header.compressed_size,
            },
        };
        self.crc.reset();
        self.compressed_read = 0;
        self.uncompressed_read = 0;

        let (year, month, day) = header.mod_date();
        tracing::trace!(
            entry = %header.file_name,
            method = header.compression_method.as_u16(),
            compressed = header.compressed_size,
            date = %format!("{:04}-{:02}-{:02}", year, month, day),
            "Read local file header"
        );

        Ok(Some(&*self.current.insert(header)))
    }

    /// Header of the entry the parser is positioned on.
    pub fn current(&self) -> Option<&LocalFileHeader> {
        self.current.as_ref()
    }

    /// Move past the rest of the current entry's data.
    ///
    /// Entries whose compressed size is known are skipped as raw bytes.
    /// Entries ending in a data descriptor have to be inflated to find
    /// their end.
    fn skip_current(&mut self) -> io::Result<()> {
        let descriptor = self
            .current
            .as_ref()
            .is_some_and(LocalFileHeader::has_data_descriptor);

        let raw_remaining = match &self.body {
            EntryBody::Done => return Ok(()),
            EntryBody::Stored { remaining } | EntryBody::Unsupported { remaining, .. } => {
                Some(*remaining)
            }
            EntryBody::Deflate { inflater } if !descriptor => self
                .current
                .as_ref()
                .map(|h| h.compressed_size.saturating_sub(inflater.total_in())),
            EntryBody::Deflate { .. } => None,
        };

        match raw_remaining {
            Some(remaining) => {
                let skipped = io::copy(&mut (&mut self.reader).take(remaining), &mut io::sink())?;
                if skipped < remaining {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "ZIP entry data is truncated",
                    ));
                }
                self.body = EntryBody::Done;
                Ok(())
            }
            None => io::copy(self, &mut io::sink()).map(|_| ()),
        }
    }

    /// Called when the current entry's data is exhausted.
    fn finish_entry(&mut self) -> io::Result<()> {
        self.body = EntryBody::Done;
        let Some(header) = &self.current else {
            return Ok(());
        };

        let expected = if header.has_data_descriptor() {
            DataDescriptor::read(&mut self.reader, header.zip64)?
        } else {
            DataDescriptor {
                crc32: header.crc32,
                compressed_size: header.compressed_size,
                uncompressed_size: header.uncompressed_size,
            }
        };

        if self.crc.sum() != expected.crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("CRC-32 mismatch in entry '{}'", header.file_name),
            ));
        }

        // Without ZIP64 the recorded sizes are the low 32 bits
        let mask = if header.zip64 { u64::MAX } else { u64::from(u32::MAX) };
        if self.compressed_read & mask != expected.compressed_size
            || self.uncompressed_read & mask != expected.uncompressed_size
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Size mismatch in entry '{}': read {}/{} bytes, expected {}/{}",
                    header.file_name,
                    self.compressed_read,
                    self.uncompressed_read,
                    expected.compressed_size,
                    expected.uncompressed_size
                ),
            ));
        }
        Ok(())
    }
}

impl<R: Read> Read for ZipStreamParser<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let (produced, at_end) = match &mut self.body {
            EntryBody::Done => return Ok(0),
            EntryBody::Unsupported { method, .. } => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unsupported compression method: {}", method),
                ));
            }
            EntryBody::Stored { remaining } => {
                if *remaining == 0 {
                    (0, true)
                } else {
                    let want = buf.len().min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                    let n = self.reader.read(&mut buf[..want])?;
                    if n == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "ZIP entry data is truncated",
                        ));
                    }
                    *remaining -= n as u64;
                    self.compressed_read += n as u64;
                    (n, *remaining == 0)
                }
            }
            EntryBody::Deflate { inflater } => {
                let result = inflate(&mut self.reader, inflater, buf)?;
                self.compressed_read = inflater.total_in();
                result
            }
        };

        self.crc.update(&buf[..produced]);
        self.uncompressed_read += produced as u64;
        if at_end {
            self.finish_entry()?;
        }
        Ok(produced)
    }
}

/// Inflate from a buffered reader, consuming only the compressed bytes used.
///
/// Returns the number of bytes written to `buf` and whether the deflate
/// stream has ended.
fn inflate<B: BufRead>(
    reader: &mut B,
    inflater: &mut Decompress,
    buf: &mut [u8],
) -> io::Result<(usize, bool)> {
    loop {
        let input = reader.fill_buf()?;
        let eof = input.is_empty();
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let flush = if eof {
            FlushDecompress::Finish
        } else {
            FlushDecompress::None
        };

        let status = inflater
            .decompress(input, buf, flush)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let consumed = (inflater.total_in() - before_in) as usize;
        let produced = (inflater.total_out() - before_out) as usize;
        reader.consume(consumed);

        match status {
            Status::StreamEnd => return Ok((produced, true)),
            _ if produced > 0 => return Ok((produced, false)),
            _ if eof => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Deflate stream ended early",
                ));
            }
            _ => continue,
        }
    }
}
