//! AssemblyStore on-disk structures.
//!
//! All records are little-endian and tightly packed. A blob is laid out as:
//!
//! ```text
//! OuterHeader                         20 bytes at offset 0
//! Descriptor   x entry_count          24 bytes each
//! HashRecord   x index_entry_count    20 bytes each, 32-bit hash order
//! HashRecord   x index_entry_count    20 bytes each, 64-bit hash order
//! payloads at absolute Descriptor::data_offset:
//!     InnerHeader                     12 bytes
//!     LZ4 block                       Descriptor::data_size bytes
//! ```

mod header;
mod index;
mod payload;

pub use header::OuterHeader;
pub use index::{Descriptor, HashRecord};
pub use payload::InnerHeader;
