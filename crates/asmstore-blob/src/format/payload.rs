//! Per-payload compressed block header.

use asmstore_common::BinaryReader;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::Result;

/// Header preceding every compressed payload.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct InnerHeader {
    /// "XALZ"
    pub magic: U32,
    /// Descriptor index recorded by the packer
    pub index: U32,
    /// Decompressed size of the payload
    pub uncompressed_size: U32,
}

const _: () = assert!(std::mem::size_of::<InnerHeader>() == InnerHeader::SIZE);

impl InnerHeader {
    /// "XALZ" read as a little-endian u32.
    pub const MAGIC: u32 = 0x5a4c4158;

    /// Encoded size in bytes.
    pub const SIZE: usize = 12;

    /// Decode a header from its raw bytes without validating it.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(BinaryReader::new(bytes).read_struct()?)
    }

    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic.get()
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index.get()
    }

    #[inline]
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size.get()
    }

    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        self.magic() == Self::MAGIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(&InnerHeader::MAGIC.to_le_bytes(), b"XALZ");
    }

    #[test]
    fn test_parse() {
        let mut bytes = [0u8; InnerHeader::SIZE];
        bytes[..4].copy_from_slice(b"XALZ");
        bytes[4..8].copy_from_slice(&3u32.to_le_bytes());
        bytes[8..].copy_from_slice(&11u32.to_le_bytes());

        let header = InnerHeader::parse(&bytes).unwrap();
        assert!(header.has_valid_magic());
        assert_eq!(header.index(), 3);
        assert_eq!(header.uncompressed_size(), 11);

        bytes[0] = b'Y';
        assert!(!InnerHeader::parse(&bytes).unwrap().has_valid_magic());
        assert!(InnerHeader::parse(&bytes[..8]).is_err());
    }
}
