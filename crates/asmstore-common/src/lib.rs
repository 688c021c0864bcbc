//! Common utilities for asmstore.
//!
//! This crate provides the foundational pieces shared by the blob decoder:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`ReadExt`] - Fixed-size record reads from seekable streams
//! - [`Arena`] - Fixed-capacity bump arena backing one decode pass

mod arena;
mod error;
mod reader;

pub use arena::{Arena, ArenaVec};
pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
