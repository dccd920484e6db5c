use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Local File Header (LFH) - 30 bytes plus name and extra field
pub const LFH_SIGNATURE: &[u8; 4] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Central Directory File Header. Seeing one means all entries have been read.
pub const CDFH_SIGNATURE: &[u8; 4] = b"PK\x01\x02";

/// End of Central Directory, reached directly by archives with no entries.
pub const EOCD_SIGNATURE: &[u8; 4] = b"PK\x05\x06";

/// Optional signature in front of a data descriptor
pub const DATA_DESCRIPTOR_SIGNATURE: &[u8; 4] = b"PK\x07\x08";

/// General purpose flag bit 0: entry is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// General purpose flag bit 3: CRC and sizes follow the data
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// ZIP64 extended information extra field ID
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Parsed Local File Header
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub last_mod_date: u16,
    /// Sizes came from a ZIP64 extra field, so a trailing data
    /// descriptor (if any) stores them as 8-byte values.
    pub zip64: bool,
}

impl LocalFileHeader {
    /// Parse the header that follows an already consumed `PK\x03\x04`.
    pub fn read_after_signature<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fixed = [0u8; LFH_SIZE - 4];
        reader.read_exact(&mut fixed)?;
        let mut cursor = Cursor::new(&fixed[..]);

        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        reader.read_exact(&mut file_name_bytes)?;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        let mut extra = vec![0u8; extra_field_length as usize];
        reader.read_exact(&mut extra)?;

        // In a local header the ZIP64 field holds uncompressed then
        // compressed size, each only when the 32-bit slot is saturated.
        let mut zip64 = false;
        let mut cursor = Cursor::new(&extra[..]);
        let end = extra.len() as u64;
        while cursor.position() + 4 <= end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()? as u64;
            let field_end = cursor.position() + field_size;
            if field_end > end {
                bail!("Truncated extra field in local header of '{}'", file_name);
            }

            if header_id == ZIP64_EXTRA_ID {
                zip64 = true;
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }

        Ok(Self {
            file_name,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            crc32,
            compressed_size,
            uncompressed_size,
            last_mod_date,
            zip64,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// CRC and sizes are not known until the entry's data has been read.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }
}

/// Trailer written after entry data when [`FLAG_DATA_DESCRIPTOR`] is set
#[derive(Debug, Clone, Copy)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Read a descriptor, with or without its optional signature.
    pub fn read<R: Read>(reader: &mut R, zip64: bool) -> std::io::Result<Self> {
        let first = reader.read_u32::<LittleEndian>()?;
        let crc32 = if first.to_le_bytes() == *DATA_DESCRIPTOR_SIGNATURE {
            reader.read_u32::<LittleEndian>()?
        } else {
            first
        };

        let (compressed_size, uncompressed_size) = if zip64 {
            (
                reader.read_u64::<LittleEndian>()?,
                reader.read_u64::<LittleEndian>()?,
            )
        } else {
            (
                reader.read_u32::<LittleEndian>()? as u64,
                reader.read_u32::<LittleEndian>()? as u64,
            )
        };

        Ok(Self {
            crc32,
            compressed_size,
            uncompressed_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn header_bytes(name: &str, flags: u16, extra: &[u8], csize: u32, usize_: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>(20).unwrap();
        buf.write_u16::<LittleEndian>(flags).unwrap();
        buf.write_u16::<LittleEndian>(8).unwrap();
        buf.write_u16::<LittleEndian>(0).unwrap();
        buf.write_u16::<LittleEndian>((44 << 9) | (3 << 5) | 15).unwrap();
        buf.write_u32::<LittleEndian>(0xDEADBEEF).unwrap();
        buf.write_u32::<LittleEndian>(csize).unwrap();
        buf.write_u32::<LittleEndian>(usize_).unwrap();
        buf.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        buf.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(extra);
        buf
    }

    #[test]
    fn parses_plain_header() {
        let bytes = header_bytes("Takeout/a.csv", 0, &[], 10, 20);
        let header = LocalFileHeader::read_after_signature(&mut &bytes[..]).unwrap();

        assert_eq!(header.file_name, "Takeout/a.csv");
        assert_eq!(header.compression_method, CompressionMethod::Deflate);
        assert_eq!(header.crc32, 0xDEADBEEF);
        assert_eq!(header.compressed_size, 10);
        assert_eq!(header.uncompressed_size, 20);
        assert_eq!(header.mod_date(), (2024, 3, 15));
        assert!(!header.zip64);
        assert!(!header.has_data_descriptor());
    }

    #[test]
    fn zip64_extra_overrides_saturated_sizes() {
        let mut extra = Vec::new();
        // An unrelated field first, which must be skipped
        extra.write_u16::<LittleEndian>(0x5455).unwrap();
        extra.write_u16::<LittleEndian>(1).unwrap();
        extra.push(0);
        extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
        extra.write_u16::<LittleEndian>(16).unwrap();
        extra.write_u64::<LittleEndian>(5_000_000_000).unwrap();
        extra.write_u64::<LittleEndian>(4_500_000_000).unwrap();

        let bytes = header_bytes("big.csv", 0, &extra, 0xFFFFFFFF, 0xFFFFFFFF);
        let header = LocalFileHeader::read_after_signature(&mut &bytes[..]).unwrap();

        assert!(header.zip64);
        assert_eq!(header.uncompressed_size, 5_000_000_000);
        assert_eq!(header.compressed_size, 4_500_000_000);
    }

    #[test]
    fn truncated_extra_field_is_rejected() {
        let mut extra = Vec::new();
        extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
        extra.write_u16::<LittleEndian>(16).unwrap();
        extra.write_u32::<LittleEndian>(1).unwrap();

        let bytes = header_bytes("x", 0, &extra, 1, 1);
        assert!(LocalFileHeader::read_after_signature(&mut &bytes[..]).is_err());
    }

    #[test]
    fn descriptor_with_and_without_signature() {
        let mut signed = Vec::new();
        signed.extend_from_slice(DATA_DESCRIPTOR_SIGNATURE);
        signed.write_u32::<LittleEndian>(7).unwrap();
        signed.write_u32::<LittleEndian>(3).unwrap();
        signed.write_u32::<LittleEndian>(9).unwrap();
        let dd = DataDescriptor::read(&mut &signed[..], false).unwrap();
        assert_eq!((dd.crc32, dd.compressed_size, dd.uncompressed_size), (7, 3, 9));

        let mut bare = Vec::new();
        bare.write_u32::<LittleEndian>(7).unwrap();
        bare.write_u64::<LittleEndian>(3).unwrap();
        bare.write_u64::<LittleEndian>(9).unwrap();
        let dd = DataDescriptor::read(&mut &bare[..], true).unwrap();
        assert_eq!((dd.crc32, dd.compressed_size, dd.uncompressed_size), (7, 3, 9));
    }
}
