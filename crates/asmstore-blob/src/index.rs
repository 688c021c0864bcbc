//! Descriptor table and hash index tables.

use std::io::Read;

use asmstore_common::{Arena, ReadExt};

use crate::entry::SkipReason;
use crate::format::{Descriptor, HashRecord, OuterHeader};
use crate::Result;

/// The three index tables of a blob, resident in the decode arena.
#[derive(Debug, Clone, Copy)]
pub struct IndexTables<'a> {
    /// `entry_count` payload descriptors
    pub descriptors: &'a [Descriptor],
    /// `index_entry_count` rows ordered by 32-bit hash
    pub hash32: &'a [HashRecord],
    /// `index_entry_count` rows ordered by 64-bit hash
    ///
    /// Read and kept for inspection; descriptor resolution only consults
    /// the 32-bit table.
    pub hash64: &'a [HashRecord],
}

impl<'a> IndexTables<'a> {
    /// Read all three tables from the reader's current position, which must
    /// be just past the outer header.
    ///
    /// A short read on any table is fatal.
    pub fn read<R: Read>(reader: &mut R, header: &OuterHeader, arena: &'a Arena) -> Result<Self> {
        let entry_count = header.entry_count() as usize;
        let index_count = header.index_entry_count() as usize;

        let descriptors = reader.read_array_in(entry_count, arena)?;
        let hash32 = reader.read_array_in(index_count, arena)?;
        let hash64 = reader.read_array_in(index_count, arena)?;

        Ok(Self {
            descriptors,
            hash32,
            hash64,
        })
    }

    /// Number of index rows to walk.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.hash32.len()
    }

    /// Resolve an index row to its hash record and payload descriptor.
    ///
    /// An out-of-range `local_store_index` is reported as a row skip.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.row_count()`.
    pub fn resolve(
        &self,
        row: usize,
    ) -> std::result::Result<(&'a HashRecord, &'a Descriptor), SkipReason> {
        let record = &self.hash32[row];
        let local_store_index = record.local_store_index();

        self.descriptors
            .get(local_store_index as usize)
            .map(|descriptor| (record, descriptor))
            .ok_or_else(|| SkipReason::DescriptorOutOfRange {
                local_store_index,
                descriptor_count: self.descriptors.len(),
            })
    }
}
