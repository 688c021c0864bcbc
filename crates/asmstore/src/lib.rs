//! Asmstore - AssemblyStore blob decoding library.
//!
//! This crate provides a unified interface to the asmstore crates.
//!
//! # Crates
//!
//! - [`asmstore_common`] - Common utilities (binary reading, bounded arena)
//! - [`asmstore_blob`] - AssemblyStore blob decoding (index tables, manifest, LZ4)
//!
//! # Example
//!
//! ```no_run
//! use asmstore::prelude::*;
//!
//! let decoder = BlobDecoder::open("assemblies.blob", DecodeOptions::default())?;
//! let arena = decoder.create_arena()?;
//! let catalog = decoder.decode(&arena)?;
//!
//! println!("Entries: {}", catalog.count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use asmstore_blob as blob;
pub use asmstore_common as common;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use asmstore_blob::{
        decode_owned, BlobDecoder, Catalog, CatalogEntry, DecodeOptions, DecompressErrorPolicy,
        EntryInfo, ErrorClass, SkipReason,
    };
    pub use asmstore_common::{Arena, BinaryReader};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
