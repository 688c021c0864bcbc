//! Outer blob header.

use asmstore_common::BinaryReader;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// File-level header found at offset 0 of every blob.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct OuterHeader {
    /// "XABA"
    pub magic: U32,
    /// Store format version
    pub version: U32,
    /// Number of rows in the descriptor table
    pub entry_count: U32,
    /// Number of rows in each hash table
    pub index_entry_count: U32,
    /// Size of the index section in bytes
    pub index_size: U32,
}

const _: () = assert!(std::mem::size_of::<OuterHeader>() == OuterHeader::SIZE);

impl OuterHeader {
    /// "XABA" read as a little-endian u32.
    pub const MAGIC: u32 = 0x41424158;

    /// Encoded size in bytes.
    pub const SIZE: usize = 20;

    /// Parse and validate a header from its raw bytes.
    ///
    /// Fails with [`Error::InvalidMagic`] when the bytes do not start with
    /// the store magic, and with a count error when either table is empty.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header: Self = BinaryReader::new(bytes)
            .read_magic_struct(Self::MAGIC)
            .map_err(|e| match e {
                asmstore_common::Error::InvalidMagic { expected, actual } => {
                    Error::InvalidMagic { expected, actual }
                }
                other => other.into(),
            })?;

        if header.entry_count() == 0 {
            return Err(Error::InvalidEntryCount);
        }
        if header.index_entry_count() == 0 {
            return Err(Error::InvalidIndexEntryCount);
        }

        Ok(header)
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version.get()
    }

    #[inline]
    pub fn entry_count(&self) -> u32 {
        self.entry_count.get()
    }

    #[inline]
    pub fn index_entry_count(&self) -> u32 {
        self.index_entry_count.get()
    }

    #[inline]
    pub fn index_size(&self) -> u32 {
        self.index_size.get()
    }

    /// Byte length of the descriptor table plus both hash tables.
    pub fn tables_size(&self) -> Option<usize> {
        let descriptors = (self.entry_count() as usize)
            .checked_mul(std::mem::size_of::<super::Descriptor>())?;
        let hashes = (self.index_entry_count() as usize)
            .checked_mul(2 * std::mem::size_of::<super::HashRecord>())?;
        descriptors.checked_add(hashes)
    }

    /// Absolute offset of the first byte after the index tables.
    pub fn tables_end(&self) -> Option<u64> {
        self.tables_size()
            .and_then(|size| size.checked_add(Self::SIZE))
            .map(|end| end as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(magic: u32, entries: u32, index_entries: u32) -> Vec<u8> {
        [magic, 1, entries, index_entries, index_entries * 20]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_parse_header() {
        let header = OuterHeader::parse(&header_bytes(OuterHeader::MAGIC, 3, 4)).unwrap();
        assert_eq!(header.version(), 1);
        assert_eq!(header.entry_count(), 3);
        assert_eq!(header.index_entry_count(), 4);
        assert_eq!(header.index_size(), 80);
        assert_eq!(header.tables_size(), Some(3 * 24 + 2 * 4 * 20));
        assert_eq!(header.tables_end(), Some(20 + 3 * 24 + 2 * 4 * 20));
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(&OuterHeader::MAGIC.to_le_bytes(), b"XABA");
    }

    #[test]
    fn test_bad_magic() {
        let err = OuterHeader::parse(&header_bytes(0x5a4c4158, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidMagic {
                expected: OuterHeader::MAGIC,
                actual: 0x5a4c4158
            }
        ));
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(matches!(
            OuterHeader::parse(&header_bytes(OuterHeader::MAGIC, 0, 1)),
            Err(Error::InvalidEntryCount)
        ));
        assert!(matches!(
            OuterHeader::parse(&header_bytes(OuterHeader::MAGIC, 1, 0)),
            Err(Error::InvalidIndexEntryCount)
        ));
    }

    #[test]
    fn test_short_header() {
        let bytes = header_bytes(OuterHeader::MAGIC, 1, 1);
        assert!(OuterHeader::parse(&bytes[..12]).is_err());
    }
}
