//! Fixed-capacity bump arena.
//!
//! Every transient object produced while decoding one blob lives in a
//! single [`Arena`], from the index tables to the catalog. Allocations are never freed
//! individually; dropping the arena releases everything at once.
//!
//! The arena enforces a hard byte budget. Backing memory comes from
//! [`bumpalo::Bump`], which grows its chunks on demand, so the budget is an
//! accounting limit rather than an up-front reservation.

use std::cell::Cell;

use bumpalo::Bump;

use crate::{Error, Result};

/// Growable vector whose storage lives in an [`Arena`].
pub type ArenaVec<'a, T> = bumpalo::collections::Vec<'a, T>;

/// Single-owner bump allocator with a fixed capacity.
///
/// Slices handed out by the arena borrow it, so none of them can outlive
/// [`Arena::reset`] or the arena itself.
pub struct Arena {
    bump: Bump,
    capacity: usize,
    cursor: Cell<usize>,
}

impl Arena {
    /// Create an arena that will hand out at most `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        Ok(Self {
            bump: Bump::new(),
            capacity,
            cursor: Cell::new(0),
        })
    }

    /// Total byte budget.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out since creation or the last reset.
    #[inline]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Bytes still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor.get()
    }

    /// Charge `size` bytes against the budget without allocating.
    ///
    /// Used for storage the arena does not hand out directly, such as the
    /// growth of an [`ArenaVec`].
    pub fn reserve(&self, size: usize) -> Result<()> {
        let cursor = self.cursor.get();
        match cursor.checked_add(size) {
            Some(end) if end <= self.capacity => {
                self.cursor.set(end);
                Ok(())
            }
            _ => {
                log::error!(
                    "arena out of memory! capacity: {:#x} used: {:#x} requested: {:#x}",
                    self.capacity,
                    cursor,
                    size
                );
                Err(Error::ArenaExhausted {
                    requested: size,
                    available: self.capacity - cursor,
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Allocate a zero-filled byte buffer.
    ///
    /// Fails without panicking when the budget or the backing allocator
    /// cannot satisfy `size`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, size: usize) -> Result<&mut [u8]> {
        let cursor = self.cursor.get();
        self.reserve(size)?;

        self.bump
            .try_alloc_slice_fill_copy(size, 0u8)
            .map_err(|_| self.allocation_failed(cursor, size))
    }

    /// Copy a string into the arena.
    pub fn alloc_str(&self, value: &str) -> Result<&str> {
        let cursor = self.cursor.get();
        self.reserve(value.len())?;

        match self.bump.try_alloc_str(value) {
            Ok(value) => Ok(value),
            Err(_) => Err(self.allocation_failed(cursor, value.len())),
        }
    }

    fn allocation_failed(&self, cursor: usize, size: usize) -> Error {
        self.cursor.set(cursor);
        log::error!("arena allocation of {:#x} bytes failed", size);
        Error::AllocationFailed { requested: size }
    }

    /// Create an empty vector backed by this arena.
    ///
    /// Grow it through [`push`](Self::push) so its storage is charged
    /// against the budget.
    pub fn vec<T>(&self) -> ArenaVec<'_, T> {
        ArenaVec::new_in(&self.bump)
    }

    /// Create a vector with room for `capacity` elements, charged up front.
    pub fn vec_with_capacity<T>(&self, capacity: usize) -> Result<ArenaVec<'_, T>> {
        let mut vec = self.vec();
        self.grow(&mut vec, capacity)?;
        Ok(vec)
    }

    /// Push onto an arena vector, charging any reallocation it needs.
    ///
    /// A reallocation leaves the old buffer in the arena, so the full size
    /// of the new buffer is charged.
    pub fn push<T>(&self, vec: &mut ArenaVec<'_, T>, value: T) -> Result<()> {
        if vec.len() == vec.capacity() {
            self.grow(vec, vec.capacity().max(4))?;
        }
        vec.push(value);
        Ok(())
    }

    fn grow<T>(&self, vec: &mut ArenaVec<'_, T>, additional: usize) -> Result<()> {
        let bytes = vec
            .capacity()
            .checked_add(additional)
            .and_then(|len| len.checked_mul(std::mem::size_of::<T>()))
            .ok_or(Error::CapacityOverflow)?;

        let cursor = self.cursor.get();
        self.reserve(bytes)?;
        vec.try_reserve_exact(additional)
            .map_err(|_| self.allocation_failed(cursor, bytes))
    }

    /// Rewind the arena so its budget can be reused.
    ///
    /// Memory handed out after a reset is not guaranteed to be zeroed by
    /// the backing allocator; [`alloc_bytes`](Self::alloc_bytes) zeroes it
    /// explicitly.
    pub fn reset(&mut self) {
        self.bump.reset();
        self.cursor.set(0);
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.cursor.get())
            .finish()
    }
}
