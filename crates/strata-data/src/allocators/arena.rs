// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bytemuck::Pod;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use strata_core::memory::{ArenaKind, MemoryError};

/// Every allocation starts on a multiple of this many bytes.
pub const ARENA_ALIGNMENT: usize = 8;

/// A typed view of an allocation made from an [`Arena`].
///
/// The slice only stores an offset and a length; reading it goes back through
/// the arena, so it cannot outlive a reset or a pop without being detected.
#[derive(Debug)]
pub struct ArenaSlice<T> {
    offset: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaSlice<T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` for a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset of the allocation inside its arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn byte_len(&self) -> usize {
        self.len * size_of::<T>()
    }

    fn reserved_len(&self) -> usize {
        self.byte_len().next_multiple_of(ARENA_ALIGNMENT)
    }
}

/// A bump allocator over a word-aligned byte region.
///
/// The behaviour on exhaustion and release depends on its [`ArenaKind`]:
///
/// | Kind      | Grows | `pop`         | `reset` |
/// |-----------|-------|---------------|---------|
/// | `Default` | yes   | top-most only | yes     |
/// | `Frame`   | yes   | top-most only | yes, by the registry once per frame |
/// | `Fixed`   | no    | top-most only | yes     |
/// | `Scratch` | yes   | strict LIFO   | yes     |
///
/// Popping anything but the most recent live allocation is refused with
/// [`MemoryError::OutOfOrderRelease`].
#[derive(Debug)]
pub struct Arena {
    kind: ArenaKind,
    words: Vec<u64>,
    top: usize,
    /// Offset and reserved bytes of each live allocation, oldest first.
    marks: Vec<(usize, usize)>,
    peak: usize,
}

impl Arena {
    /// Creates an arena with room for `capacity` bytes, rounded up to the alignment.
    pub fn new(kind: ArenaKind, capacity: usize) -> Self {
        Self {
            kind,
            words: vec![0; capacity.div_ceil(ARENA_ALIGNMENT)],
            top: 0,
            marks: Vec::new(),
            peak: 0,
        }
    }

    /// The variant this arena was created as.
    pub fn kind(&self) -> ArenaKind {
        self.kind
    }

    /// Bytes currently reserved.
    pub fn capacity(&self) -> usize {
        self.words.len() * ARENA_ALIGNMENT
    }

    /// Bytes handed out and not yet released.
    pub fn used(&self) -> usize {
        self.top
    }

    /// Highest [`Arena::used`] value since creation.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Number of live allocations.
    pub fn live_allocations(&self) -> usize {
        self.marks.len()
    }

    /// Allocates `count` zeroed elements of `T`.
    ///
    /// # Errors
    ///
    /// * [`MemoryError::UnsupportedAlignment`] if `T` needs more than
    ///   [`ARENA_ALIGNMENT`].
    /// * [`MemoryError::OutOfMemory`] if a `Fixed` arena is exhausted.
    pub fn alloc<T: Pod>(&mut self, count: usize) -> Result<ArenaSlice<T>, MemoryError> {
        if align_of::<T>() > ARENA_ALIGNMENT {
            return Err(MemoryError::UnsupportedAlignment(align_of::<T>()));
        }

        let bytes = (count * size_of::<T>()).next_multiple_of(ARENA_ALIGNMENT);
        let needed = self.top + bytes;
        if needed > self.capacity() {
            if self.kind == ArenaKind::Fixed {
                return Err(MemoryError::OutOfMemory {
                    requested: bytes,
                    available: self.capacity() - self.top,
                });
            }
            let grown = needed.max(self.capacity() * 2);
            log::debug!(
                "Arena: {:?} arena growing from {} to {} bytes",
                self.kind,
                self.capacity(),
                grown
            );
            self.words.resize(grown.div_ceil(ARENA_ALIGNMENT), 0);
        }

        let offset = self.top;
        let first_word = offset / ARENA_ALIGNMENT;
        self.words[first_word..first_word + bytes / ARENA_ALIGNMENT].fill(0);
        self.top = needed;
        self.peak = self.peak.max(self.top);
        self.marks.push((offset, bytes));

        Ok(ArenaSlice {
            offset,
            len: count,
            _marker: PhantomData,
        })
    }

    /// Allocates a copy of `values`.
    pub fn alloc_slice<T: Pod>(&mut self, values: &[T]) -> Result<ArenaSlice<T>, MemoryError> {
        let slice = self.alloc::<T>(values.len())?;
        self.get_mut(&slice)?.copy_from_slice(values);
        Ok(slice)
    }

    fn bytes_of<T>(&self, slice: &ArenaSlice<T>) -> Result<std::ops::Range<usize>, MemoryError> {
        let end = slice.offset + slice.byte_len();
        if end > self.top {
            return Err(MemoryError::StaleAllocation {
                offset: slice.offset,
            });
        }
        Ok(slice.offset..end)
    }

    /// Reads an allocation.
    ///
    /// # Errors
    ///
    /// [`MemoryError::StaleAllocation`] if the allocation was already popped
    /// or the arena was reset.
    pub fn get<T: Pod>(&self, slice: &ArenaSlice<T>) -> Result<&[T], MemoryError> {
        let range = self.bytes_of(slice)?;
        let bytes: &[u8] = bytemuck::cast_slice(&self.words);
        bytemuck::try_cast_slice(&bytes[range])
            .map_err(|_| MemoryError::UnsupportedAlignment(align_of::<T>()))
    }

    /// Writes into an allocation.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::get`].
    pub fn get_mut<T: Pod>(&mut self, slice: &ArenaSlice<T>) -> Result<&mut [T], MemoryError> {
        let range = self.bytes_of(slice)?;
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        bytemuck::try_cast_slice_mut(&mut bytes[range])
            .map_err(|_| MemoryError::UnsupportedAlignment(align_of::<T>()))
    }

    /// Releases the most recent live allocation.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfOrderRelease`] if `slice` is not the most recent
    /// live allocation. Nothing is released in that case.
    pub fn pop<T>(&mut self, slice: ArenaSlice<T>) -> Result<(), MemoryError> {
        match self.marks.last() {
            Some(&mark) if mark == (slice.offset, slice.reserved_len()) => {
                self.marks.pop();
                self.top = slice.offset;
                Ok(())
            }
            Some(&(expected, _)) => Err(MemoryError::OutOfOrderRelease {
                offset: slice.offset,
                expected,
            }),
            None => Err(MemoryError::StaleAllocation {
                offset: slice.offset,
            }),
        }
    }

    /// Releases every allocation at once, keeping the reserved capacity.
    pub fn reset(&mut self) {
        if self.kind == ArenaKind::Scratch && !self.marks.is_empty() {
            log::warn!(
                "Arena: resetting a scratch arena with {} live allocations",
                self.marks.len()
            );
        }
        self.top = 0;
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_aligned_storage() {
        let mut arena = Arena::new(ArenaKind::Default, 64);
        let a = arena.alloc::<u8>(3).unwrap();
        let b = arena.alloc::<u32>(2).unwrap();

        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 8);
        assert_eq!(arena.get(&b).unwrap(), &[0, 0]);
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn alloc_slice_copies_values() {
        let mut arena = Arena::new(ArenaKind::Scratch, 16);
        let slice = arena.alloc_slice(&[1u32, 2, 3]).unwrap();
        assert_eq!(arena.get(&slice).unwrap(), &[1, 2, 3]);

        arena.get_mut(&slice).unwrap()[1] = 20;
        assert_eq!(arena.get(&slice).unwrap(), &[1, 20, 3]);
    }

    #[test]
    fn scratch_pops_must_be_lifo() {
        let mut arena = Arena::new(ArenaKind::Scratch, 64);
        let first = arena.alloc::<u32>(4).unwrap();
        let second = arena.alloc::<u32>(4).unwrap();

        let err = arena.pop(first).unwrap_err();
        assert_eq!(
            err,
            MemoryError::OutOfOrderRelease {
                offset: 0,
                expected: 16
            }
        );
        assert_eq!(arena.live_allocations(), 2);

        arena.pop(second).unwrap();
        let first = ArenaSlice::<u32> {
            offset: 0,
            len: 4,
            _marker: PhantomData,
        };
        arena.pop(first).unwrap();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.peak(), 32);
    }

    #[test]
    fn empty_allocation_cannot_be_popped_under_a_later_one() {
        let mut arena = Arena::new(ArenaKind::Scratch, 64);
        let empty = arena.alloc::<u32>(0).unwrap();
        let data = arena.alloc_slice(&[9u64, 10]).unwrap();
        assert_eq!(empty.offset(), data.offset());

        assert_eq!(
            arena.pop(empty).unwrap_err(),
            MemoryError::OutOfOrderRelease {
                offset: 0,
                expected: 0
            }
        );
        assert_eq!(arena.used(), 16);
        assert_eq!(arena.get(&data).unwrap(), &[9, 10]);
    }

    #[test]
    fn popped_allocation_reads_as_stale() {
        let mut arena = Arena::new(ArenaKind::Scratch, 64);
        let slice = arena.alloc::<u64>(2).unwrap();
        let copy = ArenaSlice::<u64> {
            offset: slice.offset,
            len: slice.len,
            _marker: PhantomData,
        };
        arena.pop(slice).unwrap();

        assert_eq!(
            arena.get(&copy).unwrap_err(),
            MemoryError::StaleAllocation { offset: 0 }
        );
    }

    #[test]
    fn fixed_arena_refuses_to_grow() {
        let mut arena = Arena::new(ArenaKind::Fixed, 16);
        arena.alloc::<u64>(2).unwrap();

        let err = arena.alloc::<u8>(1).unwrap_err();
        assert_eq!(
            err,
            MemoryError::OutOfMemory {
                requested: 8,
                available: 0
            }
        );
        assert_eq!(arena.capacity(), 16);
    }

    #[test]
    fn default_arena_grows_and_keeps_contents() {
        let mut arena = Arena::new(ArenaKind::Default, 8);
        let a = arena.alloc_slice(&[7u64]).unwrap();
        let b = arena.alloc_slice(&[1u32, 2, 3, 4]).unwrap();

        assert!(arena.capacity() >= 24);
        assert_eq!(arena.get(&a).unwrap(), &[7]);
        assert_eq!(arena.get(&b).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn over_aligned_types_are_rejected() {
        let mut arena = Arena::new(ArenaKind::Default, 64);
        let result = arena.alloc::<u128>(1);
        if align_of::<u128>() > ARENA_ALIGNMENT {
            assert_eq!(
                result.unwrap_err(),
                MemoryError::UnsupportedAlignment(align_of::<u128>())
            );
        } else {
            assert!(result.is_ok());
        }
    }

    #[test]
    fn reset_releases_everything() {
        let mut arena = Arena::new(ArenaKind::Frame, 32);
        arena.alloc::<u32>(3).unwrap();
        arena.alloc::<u32>(3).unwrap();
        arena.reset();

        assert_eq!(arena.used(), 0);
        assert_eq!(arena.live_allocations(), 0);
        assert_eq!(arena.alloc::<u32>(1).unwrap().offset(), 0);
    }
}
