//! Binary readers for fixed-layout records.
//!
//! [`BinaryReader`] is a cursor over a byte slice for zero-copy parsing.
//! [`ReadExt`] pulls fixed-size record tables and payload bytes out of a
//! stream into an [`Arena`].

use std::io::Read;

use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::{Arena, Error, Result};

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// # Example
///
/// ```
/// use asmstore_common::BinaryReader;
///
/// let data = [0x58, 0x41, 0x42, 0x41, 0x01, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x41424158);
/// assert_eq!(reader.read_u32().unwrap(), 1);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Peek at a little-endian u32 without advancing.
    #[inline]
    pub fn peek_u32(&self) -> Result<u32> {
        let bytes = self.peek_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read a struct whose first field is a u32 magic, checking it first.
    pub fn read_magic_struct<T: FromBytes>(&mut self, magic: u32) -> Result<T> {
        let actual = self.peek_u32()?;
        if actual != magic {
            return Err(Error::InvalidMagic {
                expected: magic,
                actual,
            });
        }
        self.read_struct()
    }
}

/// Extension trait for reading fixed-size records from streams.
pub trait ReadExt: Read {
    /// Read `count` consecutive records into arena memory.
    ///
    /// The records must have an alignment of 1 (packed layouts), since the
    /// arena slice is reinterpreted in place.
    fn read_array_in<'a, T>(&mut self, count: usize, arena: &'a Arena) -> Result<&'a [T]>
    where
        T: FromBytes + KnownLayout + Immutable,
    {
        let size = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(Error::CapacityOverflow)?;
        let bytes = arena.alloc_bytes(size)?;
        self.read_exact(bytes)?;

        let bytes: &'a [u8] = bytes;
        <[T]>::ref_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Fill `buf` from the stream, stopping early only at end of stream.
    ///
    /// Returns the number of bytes read. Interrupted reads are retried and
    /// every other I/O failure is returned as an error, so a short count
    /// always means the stream hit its end.
    fn read_until_eof(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
