//! Descriptor and hash index records.

use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Location and size of one stored payload's regions.
///
/// Offsets are absolute file offsets. Only the data region is decoded; the
/// debug and config regions are carried for inspection.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct Descriptor {
    /// Offset of the payload's inner header
    pub data_offset: U32,
    /// Compressed byte count following the inner header
    pub data_size: U32,
    /// Offset of debug symbols, 0 if absent
    pub debug_data_offset: U32,
    /// Size of debug symbols
    pub debug_data_size: U32,
    /// Offset of the config blob, 0 if absent
    pub config_data_offset: U32,
    /// Size of the config blob
    pub config_data_size: U32,
}

const _: () = assert!(std::mem::size_of::<Descriptor>() == 24);

impl Descriptor {
    #[inline]
    pub fn data_offset(&self) -> u32 {
        self.data_offset.get()
    }

    #[inline]
    pub fn data_size(&self) -> u32 {
        self.data_size.get()
    }

    #[inline]
    pub fn has_debug_data(&self) -> bool {
        self.debug_data_size.get() != 0
    }

    #[inline]
    pub fn has_config_data(&self) -> bool {
        self.config_data_size.get() != 0
    }
}

/// One row of a hash index table.
///
/// Both hash tables share this layout. The 8-byte hash field holds a u64 in
/// the 64-bit table and a u32 (low half, upper half zero) in the 32-bit one.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C, packed)]
pub struct HashRecord {
    pub hash: U64,
    pub mapping_index: U32,
    /// Row in the descriptor table
    pub local_store_index: U32,
    pub store_id: U32,
}

const _: () = assert!(std::mem::size_of::<HashRecord>() == 20);

impl HashRecord {
    /// Hash interpreted as a 32-bit value.
    #[inline]
    pub fn hash32(&self) -> u32 {
        self.hash.get() as u32
    }

    /// Hash interpreted as a 64-bit value.
    #[inline]
    pub fn hash64(&self) -> u64 {
        self.hash.get()
    }

    #[inline]
    pub fn mapping_index(&self) -> u32 {
        self.mapping_index.get()
    }

    #[inline]
    pub fn local_store_index(&self) -> u32 {
        self.local_store_index.get()
    }

    #[inline]
    pub fn store_id(&self) -> u32 {
        self.store_id.get()
    }
}
