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

//! The handle encoding shared by every pool.

use std::fmt::Debug;
use std::hash::Hash;

/// An opaque handle packing a slot index and a generation tag.
///
/// The index occupies the low [`Entity::INDEX_BITS`] bits, the generation the
/// remaining high bits. A pool never issues generation `0`, so the all-zero
/// value is free to act as [`Entity::NULL`].
pub trait Entity: Copy + Eq + Hash + Debug + 'static {
    /// Bits reserved for the slot index.
    const INDEX_BITS: u32;
    /// Bits reserved for the generation tag.
    const GENERATION_BITS: u32;
    /// The handle that never refers to anything.
    const NULL: Self;

    /// Packs `index` and `generation`; both are truncated to their bit width.
    fn from_parts(index: usize, generation: u32) -> Self;

    /// The slot index.
    fn index(self) -> usize;

    /// The generation tag.
    fn generation(self) -> u32;

    /// The raw encoded value, for logs and error reports.
    fn to_raw(self) -> u64;

    /// Largest generation tag representable by this handle type.
    fn max_generation() -> u32 {
        ((1u64 << Self::GENERATION_BITS) - 1) as u32
    }

    /// Number of slots this handle type can address.
    fn max_slots() -> usize {
        1usize << Self::INDEX_BITS
    }

    /// `true` for the null handle.
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

macro_rules! impl_raw_entity {
    ($raw:ty, $index_bits:expr) => {
        impl Entity for $raw {
            const INDEX_BITS: u32 = $index_bits;
            const GENERATION_BITS: u32 = <$raw>::BITS - $index_bits;
            const NULL: Self = 0;

            #[inline]
            fn from_parts(index: usize, generation: u32) -> Self {
                let index_mask = (1 << Self::INDEX_BITS) - 1;
                let generation = (generation as $raw) & (<$raw>::MAX >> Self::INDEX_BITS);
                (generation << Self::INDEX_BITS) | (index as $raw & index_mask)
            }

            #[inline]
            fn index(self) -> usize {
                (self & ((1 << Self::INDEX_BITS) - 1)) as usize
            }

            #[inline]
            fn generation(self) -> u32 {
                (self >> Self::INDEX_BITS) as u32
            }

            #[inline]
            fn to_raw(self) -> u64 {
                self as u64
            }
        }
    };
}

impl_raw_entity!(u16, 8);
impl_raw_entity!(u32, 16);

/// Declares a typed handle backed by a raw [`Entity`] integer.
///
/// Distinct handle types keep a texture handle from being used to look up a
/// buffer, even though both are plain integers underneath.
///
/// ```
/// strata_data::strata_handle! {
///     /// A mesh slot.
///     pub struct MeshHandle(u32);
/// }
///
/// use strata_data::Entity;
/// let handle = MeshHandle::from_parts(3, 7);
/// assert_eq!(handle.index(), 3);
/// assert_eq!(handle.generation(), 7);
/// assert!(MeshHandle::default().is_null());
/// ```
#[macro_export]
macro_rules! strata_handle {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident($raw:ty);
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name($raw);

        impl $crate::pool::Entity for $name {
            const INDEX_BITS: u32 = <$raw as $crate::pool::Entity>::INDEX_BITS;
            const GENERATION_BITS: u32 = <$raw as $crate::pool::Entity>::GENERATION_BITS;
            const NULL: Self = Self(<$raw as $crate::pool::Entity>::NULL);

            #[inline]
            fn from_parts(index: usize, generation: u32) -> Self {
                Self(<$raw as $crate::pool::Entity>::from_parts(index, generation))
            }

            #[inline]
            fn index(self) -> usize {
                <$raw as $crate::pool::Entity>::index(self.0)
            }

            #[inline]
            fn generation(self) -> u32 {
                <$raw as $crate::pool::Entity>::generation(self.0)
            }

            #[inline]
            fn to_raw(self) -> u64 {
                <$raw as $crate::pool::Entity>::to_raw(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as $crate::pool::Entity>::NULL
            }
        }

        impl From<$name> for u64 {
            fn from(handle: $name) -> u64 {
                <$name as $crate::pool::Entity>::to_raw(handle)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_packs_eight_and_eight() {
        let h = u16::from_parts(0x12, 0x34);
        assert_eq!(h, 0x3412);
        assert_eq!(h.index(), 0x12);
        assert_eq!(h.generation(), 0x34);
        assert_eq!(<u16 as Entity>::max_generation(), 0xff);
        assert_eq!(<u16 as Entity>::max_slots(), 256);
    }

    #[test]
    fn u32_packs_sixteen_and_sixteen() {
        let h = u32::from_parts(0xbeef, 0xcafe);
        assert_eq!(h, 0xcafe_beef);
        assert_eq!(h.index(), 0xbeef);
        assert_eq!(h.generation(), 0xcafe);
        assert_eq!(<u32 as Entity>::max_generation(), 0xffff);
    }

    #[test]
    fn out_of_range_parts_are_truncated() {
        let h = u16::from_parts(0x1ff, 0x1ff);
        assert_eq!(h.index(), 0xff);
        assert_eq!(h.generation(), 0xff);
    }

    #[test]
    fn zero_is_null() {
        assert!(0u32.is_null());
        assert!(!u32::from_parts(0, 1).is_null());
    }
}
