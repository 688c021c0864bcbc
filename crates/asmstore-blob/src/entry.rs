//! Decoded entry catalog.

use asmstore_common::{Arena, ArenaVec};
use thiserror::Error;

use crate::manifest::NameError;
use crate::Result;

/// One decoded payload.
///
/// The name lives in the decode arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry<'a> {
    /// Resolved or synthesized file name
    pub name: &'a str,
    /// Decompressed size in bytes
    pub size: u32,
    /// 32-bit content hash of the index row
    pub hash32: u32,
    /// Index-table row this entry came from
    pub row: usize,
}

impl CatalogEntry<'_> {
    /// Copy the entry out of the arena.
    pub fn to_info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name.to_string(),
            size: self.size,
            hash32: self.hash32,
        }
    }
}

/// Owned copy of a [`CatalogEntry`], independent of the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntryInfo {
    pub name: String,
    pub size: u32,
    pub hash32: u32,
}

/// Why an index row produced no entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("local store index {local_store_index:#x} is outside the {descriptor_count}-row descriptor table")]
    DescriptorOutOfRange {
        local_store_index: u32,
        descriptor_count: usize,
    },

    #[error("hash {hash32:#010x} not found in manifest")]
    NotInManifest { hash32: u32 },

    #[error("manifest name rejected: {0}")]
    InvalidName(NameError),

    #[error("inner header at {offset:#x} is truncated")]
    TruncatedInnerHeader { offset: u32 },

    #[error("invalid XALZ magic signature {actual:#010x}")]
    InvalidInnerMagic { actual: u32 },

    #[error("invalid XALZ payload size value")]
    EmptyPayload,

    #[error("decompression failed: {0}")]
    Decompression(String),
}

/// An index row that was dropped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Ordered result of one decode pass.
///
/// Entries appear in index-table row order. Both the entries and their
/// names are stored in the arena the decode ran in.
pub struct Catalog<'a> {
    arena: &'a Arena,
    entries: ArenaVec<'a, CatalogEntry<'a>>,
    skipped: ArenaVec<'a, SkippedRow>,
}

impl<'a> Catalog<'a> {
    /// Create a catalog with room for `rows` entries and skips.
    pub(crate) fn with_rows(arena: &'a Arena, rows: usize) -> Result<Self> {
        Ok(Self {
            arena,
            entries: arena.vec_with_capacity(rows)?,
            skipped: arena.vec_with_capacity(rows)?,
        })
    }

    /// Append an entry at the tail, copying its name into the arena.
    pub fn append(&mut self, name: &str, size: u32, hash32: u32, row: usize) -> Result<()> {
        let name = self.arena.alloc_str(name)?;
        let entry = CatalogEntry {
            name,
            size,
            hash32,
            row,
        };
        Ok(self.arena.push(&mut self.entries, entry)?)
    }

    pub(crate) fn skip(&mut self, row: usize, reason: SkipReason) -> Result<()> {
        log::warn!("skipping row {}: {}", row, reason);

        Ok(self.arena.push(&mut self.skipped, SkippedRow { row, reason })?)
    }

    /// Number of entries appended so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in row order.
    #[inline]
    pub fn entries(&self) -> &[CatalogEntry<'a>] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&CatalogEntry<'a>> {
        self.entries.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry<'a>> {
        self.entries.iter()
    }

    /// Rows dropped during the decode, in row order.
    #[inline]
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    /// Copy every entry out of the arena.
    pub fn to_infos(&self) -> Vec<EntryInfo> {
        self.entries.iter().map(CatalogEntry::to_info).collect()
    }
}

impl<'b, 'a> IntoIterator for &'b Catalog<'a> {
    type Item = &'b CatalogEntry<'a>;
    type IntoIter = std::slice::Iter<'b, CatalogEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Debug for Catalog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("entries", &self.entries.len())
            .field("skipped", &self.skipped.len())
            .finish()
    }
}
