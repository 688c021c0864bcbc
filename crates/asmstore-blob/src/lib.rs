//! AssemblyStore blob decoder.
//!
//! An AssemblyStore blob (`XABA`) packs many LZ4-compressed assemblies
//! behind a descriptor table and two hash index tables. Entry names come
//! from an optional companion manifest. Every `XALZ` payload is
//! decompressed and can be written out next to the blob.
//!
//! All table storage, payload buffers and catalog names come from a single
//! bounded [`Arena`](asmstore_common::Arena) sized from the header, so a
//! decode either fits its budget or fails with an allocation error.
//!
//! # Example
//!
//! ```no_run
//! use asmstore_blob::{BlobDecoder, DecodeOptions};
//!
//! let decoder = BlobDecoder::open("assemblies.blob", DecodeOptions::new().extract(true))?;
//! let arena = decoder.create_arena()?;
//! let catalog = decoder.decode(&arena)?;
//!
//! for entry in &catalog {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! # Ok::<(), asmstore_blob::Error>(())
//! ```

mod decoder;
mod decompress;
mod entry;
mod error;
pub mod format;
mod index;
pub mod manifest;
mod options;

pub use decoder::{
    arena_capacity_for, decode_owned, read_outer_header, BlobDecoder, ARENA_BYTES_PER_ENTRY,
    CATALOG_BYTES_PER_ROW,
};
pub use decompress::decompress_lz4;
pub use entry::{Catalog, CatalogEntry, EntryInfo, SkipReason, SkippedRow};
pub use error::{Error, ErrorClass, Result};
pub use format::{Descriptor, HashRecord, InnerHeader, OuterHeader};
pub use index::IndexTables;
pub use manifest::{Manifest, ManifestRecord, NameError};
pub use options::{DecodeOptions, DecompressErrorPolicy};
