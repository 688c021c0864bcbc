//! AssemblyStore blob decoder.
//!
//! One [`BlobDecoder`] performs one sequential pass over a blob:
//!
//! 1. read and validate the outer header
//! 2. read the descriptor table and both hash tables into the arena
//! 3. for every row of the 32-bit hash table, resolve its descriptor and
//!    name, then decompress the payload behind it
//!
//! Rows with a bad index, header or name are skipped. Everything else that
//! goes wrong aborts the pass.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use asmstore_common::{Arena, ReadExt};

use crate::decompress::decompress_lz4;
use crate::entry::{Catalog, EntryInfo, SkipReason, SkippedRow};
use crate::format::{InnerHeader, OuterHeader};
use crate::index::IndexTables;
use crate::manifest::{self, Manifest, MAX_NAME_LEN};
use crate::options::{DecodeOptions, DecompressErrorPolicy};
use crate::{CatalogEntry, Error, Result};

/// Arena budget reserved per descriptor for payload buffers.
pub const ARENA_BYTES_PER_ENTRY: usize = 1024 * 1024;

/// Arena budget reserved per index row for catalog bookkeeping.
pub const CATALOG_BYTES_PER_ROW: usize =
    MAX_NAME_LEN + std::mem::size_of::<CatalogEntry<'static>>() + std::mem::size_of::<SkippedRow>();

/// Arena budget for decoding a blob with this header.
///
/// Computed before any table is read: 1 MiB per descriptor, catalog
/// bookkeeping per index row, plus the exact size of the index tables.
pub fn arena_capacity_for(header: &OuterHeader) -> Result<usize> {
    let payloads = (header.entry_count() as usize).checked_mul(ARENA_BYTES_PER_ENTRY);
    let catalog = (header.index_entry_count() as usize).checked_mul(CATALOG_BYTES_PER_ROW);

    payloads
        .zip(catalog)
        .and_then(|(payloads, catalog)| payloads.checked_add(catalog))
        .zip(header.tables_size())
        .and_then(|(budget, tables)| budget.checked_add(tables))
        .ok_or_else(|| asmstore_common::Error::CapacityOverflow.into())
}

/// Read and validate the outer header at offset 0.
pub fn read_outer_header<R: Read + Seek>(reader: &mut R) -> Result<OuterHeader> {
    reader.seek(SeekFrom::Start(0))?;

    let mut bytes = [0u8; OuterHeader::SIZE];
    reader.read_exact(&mut bytes)?;

    OuterHeader::parse(&bytes)
}

/// Per-row failure: either the row is dropped or the whole decode stops.
enum RowError {
    Skip(SkipReason),
    Fatal(Error),
}

impl From<SkipReason> for RowError {
    fn from(reason: SkipReason) -> Self {
        RowError::Skip(reason)
    }
}

impl From<Error> for RowError {
    fn from(error: Error) -> Self {
        RowError::Fatal(error)
    }
}

impl From<io::Error> for RowError {
    fn from(error: io::Error) -> Self {
        RowError::Fatal(Error::Io(error))
    }
}

impl From<asmstore_common::Error> for RowError {
    fn from(error: asmstore_common::Error) -> Self {
        RowError::Fatal(Error::Common(error))
    }
}

/// A decompressed payload, still in the arena.
struct Payload<'a> {
    name: String,
    hash32: u32,
    data: &'a [u8],
}

/// Sequential decoder for one blob and its optional manifest.
///
/// The decoder owns the blob and manifest handles; they are closed when
/// [`decode`](Self::decode) returns, whether it succeeds or not.
pub struct BlobDecoder<R, M = BufReader<File>> {
    reader: R,
    manifest: Option<Manifest<M>>,
    blob_path: PathBuf,
    header: OuterHeader,
    options: DecodeOptions,
}

impl BlobDecoder<BufReader<File>> {
    /// Open a blob file and its companion manifest.
    ///
    /// The manifest is optional: when it cannot be opened, entries get
    /// synthesized `0x<hash>.dll` names.
    pub fn open<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = match read_outer_header(&mut reader) {
            Ok(header) => header,
            Err(e) => {
                if let Error::InvalidMagic { .. } = e {
                    log::error!("{} is not an AssemblyStore file", path.display());
                }
                return Err(e);
            }
        };

        let manifest_path = options
            .manifest_path
            .clone()
            .unwrap_or_else(|| manifest::manifest_path(path));
        let manifest = match Manifest::open(&manifest_path) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                log::warn!(
                    "failed opening manifest file {}: {}",
                    manifest_path.display(),
                    e
                );
                None
            }
        };

        Ok(Self::with_header(reader, path, manifest, header, options))
    }
}

impl<R: Read + Seek, M: BufRead + Seek> BlobDecoder<R, M> {
    /// Create a decoder over an already-open blob stream.
    ///
    /// `blob_path` only determines where extracted payloads are written.
    pub fn new(
        mut reader: R,
        blob_path: impl Into<PathBuf>,
        manifest: Option<Manifest<M>>,
        options: DecodeOptions,
    ) -> Result<Self> {
        let header = read_outer_header(&mut reader)?;
        Ok(Self::with_header(reader, blob_path, manifest, header, options))
    }

    fn with_header(
        reader: R,
        blob_path: impl Into<PathBuf>,
        manifest: Option<Manifest<M>>,
        header: OuterHeader,
        options: DecodeOptions,
    ) -> Self {
        if options.verbose {
            log::debug!(
                "magic: {:#x}, version: {:#x}, entries: {}, index_entries: {}, index_size: {}",
                header.magic.get(),
                header.version(),
                header.entry_count(),
                header.index_entry_count(),
                header.index_size()
            );
        }

        Self {
            reader,
            manifest,
            blob_path: blob_path.into(),
            header,
            options,
        }
    }

    /// The validated outer header.
    #[inline]
    pub fn header(&self) -> &OuterHeader {
        &self.header
    }

    /// Whether names will come from a manifest.
    #[inline]
    pub fn has_manifest(&self) -> bool {
        self.manifest.is_some()
    }

    /// Arena budget for this blob, honoring any override in the options.
    pub fn arena_capacity(&self) -> Result<usize> {
        match self.options.arena_capacity {
            Some(capacity) => Ok(capacity),
            None => arena_capacity_for(&self.header),
        }
    }

    /// Create an arena sized for this blob.
    pub fn create_arena(&self) -> Result<Arena> {
        Ok(Arena::new(self.arena_capacity()?)?)
    }

    /// Read the descriptor table and both hash tables into `arena`.
    ///
    /// Fails before allocating anything when the header declares tables
    /// larger than the file.
    pub fn read_tables<'a>(&mut self, arena: &'a Arena) -> Result<IndexTables<'a>> {
        let file_len = self.reader.seek(SeekFrom::End(0))?;
        let tables_end = self.header.tables_end().unwrap_or(u64::MAX);
        if tables_end > file_len {
            log::error!(
                "index tables end at {:#x}, past the end of the file at {:#x}",
                tables_end,
                file_len
            );
            return Err(Error::TruncatedTables {
                tables_end,
                file_len,
            });
        }

        self.reader.seek(SeekFrom::Start(OuterHeader::SIZE as u64))?;
        IndexTables::read(&mut self.reader, &self.header, arena)
    }

    /// Decode every entry, writing payloads to disk when extraction is on.
    pub fn decode(self, arena: &Arena) -> Result<Catalog<'_>> {
        self.decode_with(arena, |path, data| fs::write(path, data))
    }

    /// Decode every entry, handing extracted payloads to `sink`.
    ///
    /// `sink` is only called when [`DecodeOptions::extract`] is set.
    pub fn decode_with<'a, F>(mut self, arena: &'a Arena, mut sink: F) -> Result<Catalog<'a>>
    where
        F: FnMut(&Path, &[u8]) -> io::Result<()>,
    {
        let tables = self.read_tables(arena)?;
        let mut catalog = Catalog::with_rows(arena, tables.row_count())?;

        for row in 0..tables.row_count() {
            let payload = match self.decode_row(row, &tables, arena) {
                Ok(payload) => payload,
                Err(RowError::Skip(reason)) => {
                    catalog.skip(row, reason)?;
                    continue;
                }
                Err(RowError::Fatal(e)) => return Err(e),
            };

            let size = payload.data.len() as u32;
            catalog.append(&payload.name, size, payload.hash32, row)?;

            if self.options.extract {
                let path = self.output_path(&payload.name);
                sink(&path, payload.data).map_err(|source| Error::Write { path, source })?;
            }
        }

        Ok(catalog)
    }

    fn decode_row<'a>(
        &mut self,
        row: usize,
        tables: &IndexTables<'a>,
        arena: &'a Arena,
    ) -> std::result::Result<Payload<'a>, RowError> {
        let (record, descriptor) = tables.resolve(row)?;
        let hash32 = record.hash32();
        let name = self.resolve_name(hash32)?;

        let offset = descriptor.data_offset();
        self.reader.seek(SeekFrom::Start(u64::from(offset)))?;

        let mut bytes = [0u8; InnerHeader::SIZE];
        match self.reader.read_exact(&mut bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(SkipReason::TruncatedInnerHeader { offset }.into());
            }
            Err(e) => return Err(e.into()),
        }
        let inner = InnerHeader::parse(&bytes)?;

        if self.options.verbose {
            log::debug!(
                "file: {} pos: {:#x} index: {} xalz.index: {} mapping: {} store: {} magic: {:#x} xalz.size: {:#x} data_offset: {:#x} data_size: {} debug_data: {} config_data: {}",
                name,
                offset,
                record.local_store_index(),
                inner.index(),
                record.mapping_index(),
                record.store_id(),
                inner.magic(),
                inner.uncompressed_size(),
                offset,
                descriptor.data_size(),
                descriptor.has_debug_data(),
                descriptor.has_config_data()
            );
        }

        if !inner.has_valid_magic() {
            return Err(SkipReason::InvalidInnerMagic {
                actual: inner.magic(),
            }
            .into());
        }
        if inner.uncompressed_size() == 0 {
            return Err(SkipReason::EmptyPayload.into());
        }

        let compressed = arena.alloc_bytes(descriptor.data_size() as usize)?;
        let read = self.reader.read_until_eof(compressed)?;
        if read < compressed.len() {
            log::warn!(
                "payload for {} truncated at end of file: {} of {} bytes",
                name,
                read,
                compressed.len()
            );
        }

        let data = arena.alloc_bytes(inner.uncompressed_size() as usize)?;
        if let Err(e) = decompress_lz4(row, compressed, data) {
            return match self.options.on_decompress_error {
                DecompressErrorPolicy::Abort => {
                    log::error!("{}", e);
                    Err(e.into())
                }
                DecompressErrorPolicy::SkipRow => {
                    Err(SkipReason::Decompression(e.to_string()).into())
                }
            };
        }

        Ok(Payload {
            name,
            hash32,
            data,
        })
    }

    fn resolve_name(&mut self, hash32: u32) -> std::result::Result<String, RowError> {
        let Some(manifest) = self.manifest.as_mut() else {
            return Ok(manifest::fallback_name(hash32));
        };

        let record = manifest
            .find(hash32)?
            .ok_or(SkipReason::NotInManifest { hash32 })?;

        record
            .dll_name()
            .map_err(|e| SkipReason::InvalidName(e).into())
    }

    /// Where an entry named `name` is written: next to the blob.
    pub fn output_path(&self, name: &str) -> PathBuf {
        match self.blob_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
            _ => PathBuf::from(name),
        }
    }
}

impl<R, M> std::fmt::Debug for BlobDecoder<R, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobDecoder")
            .field("blob_path", &self.blob_path)
            .field("header", &self.header)
            .field("manifest", &self.manifest)
            .field("options", &self.options)
            .finish()
    }
}

/// Decode a blob and copy its catalog out of the arena.
///
/// The arena is created and released internally.
pub fn decode_owned<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Vec<EntryInfo>> {
    let decoder = BlobDecoder::open(path, options)?;
    let arena = decoder.create_arena()?;
    let catalog = decoder.decode(&arena)?;
    let entries = catalog.to_infos();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn header_bytes(entries: u32, index_entries: u32) -> Vec<u8> {
        [OuterHeader::MAGIC, 1, entries, index_entries, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    fn decoder(bytes: Vec<u8>) -> Result<BlobDecoder<Cursor<Vec<u8>>, Cursor<Vec<u8>>>> {
        BlobDecoder::new(
            Cursor::new(bytes),
            "out/assemblies.blob",
            None,
            DecodeOptions::default(),
        )
    }

    #[test]
    fn test_capacity_heuristic() {
        let header = OuterHeader::parse(&header_bytes(2, 3)).unwrap();
        let capacity = arena_capacity_for(&header).unwrap();
        assert_eq!(
            capacity,
            2 * ARENA_BYTES_PER_ENTRY + 3 * CATALOG_BYTES_PER_ROW + 2 * 24 + 2 * 3 * 20
        );
    }

    #[test]
    fn test_capacity_override() {
        let decoder = BlobDecoder::<_, Cursor<Vec<u8>>>::new(
            Cursor::new(header_bytes(1, 1)),
            "assemblies.blob",
            None,
            DecodeOptions::new().arena_capacity(64),
        )
        .unwrap();
        assert_eq!(decoder.arena_capacity().unwrap(), 64);
        assert_eq!(decoder.create_arena().unwrap().capacity(), 64);
    }

    #[test]
    fn test_short_header_is_io_error() {
        let err = decoder(header_bytes(1, 1)[..10].to_vec()).unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Io);
    }

    #[test]
    fn test_output_path() {
        let decoder = decoder(header_bytes(1, 1)).unwrap();
        assert_eq!(
            decoder.output_path("mylib.dll"),
            PathBuf::from("out/mylib.dll")
        );

        let bare = BlobDecoder::<_, Cursor<Vec<u8>>>::new(
            Cursor::new(header_bytes(1, 1)),
            "assemblies.blob",
            None,
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(bare.output_path("mylib.dll"), PathBuf::from("mylib.dll"));
    }

    #[test]
    fn test_missing_tables_is_fatal() {
        let decoder = decoder(header_bytes(2, 2)).unwrap();
        let arena = decoder.create_arena().unwrap();
        let err = decoder.decode(&arena).unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Io);
    }

    #[test]
    fn test_oversized_tables_rejected_before_allocation() {
        let mut decoder = decoder(header_bytes(0x4000_0000, 1)).unwrap();
        let arena = Arena::new(usize::MAX).unwrap();

        let err = decoder.read_tables(&arena).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedTables {
                file_len: 20,
                ..
            }
        ));
        assert_eq!(err.class(), crate::ErrorClass::Io);
        assert_eq!(arena.used(), 0);
    }
}
