//! Streaming ZIP archive reading.
//!
//! This module reads ZIP archives in a single forward pass, so an archive
//! can be consumed straight from any byte stream without seeking.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (local headers, data descriptors)
//! - [`parser`]: Walks the archive entry by entry and decompresses the current one
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Only the first part is needed here: entries are discovered through
//! their local headers and reading stops at the Central Directory.
//!
//! ## Supported Features
//!
//! - STORED (no compression) method
//! - DEFLATE compression method, including entries with data descriptors
//! - ZIP64 sizes in local headers
//! - CRC-32 verification of fully read entries
//!
//! ## Limitations
//!
//! - No encryption support
//! - No BZIP2, LZMA, or other compression methods
//! - STORED entries written with a data descriptor cannot be streamed

mod parser;
mod structures;

pub use parser::ZipStreamParser;
pub use structures::*;
