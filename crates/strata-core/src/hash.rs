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

//! Deterministic 32-bit content hashing.
//!
//! Every cache key in the renderer (pipeline states, resource bindings, baked
//! commands and their per-aspect hashes) is produced here. The hash must be
//! stable across runs and platforms, so `std`'s randomly seeded hashers are not
//! an option. Bytes are digested with 32-bit FNV-1a and values are folded
//! together with [`combine`], which is deliberately order-sensitive.

/// Multiplier used by [`combine`] (the 32-bit FNV prime).
pub const PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a offset basis, also used as the seed of [`ContentHasher`].
pub const OFFSET_BASIS: u32 = 0x811c_9dc5;

/// Folds `b` into `a`: `(a * PRIME) ^ b`.
///
/// The operation is not commutative: `combine(a, b)` and `combine(b, a)`
/// generally differ, so the order in which fields are combined is part of
/// the resulting key.
#[inline]
#[must_use]
pub const fn combine(a: u32, b: u32) -> u32 {
    a.wrapping_mul(PRIME) ^ b
}

/// Hashes a byte slice with 32-bit FNV-1a.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(PRIME)
    })
}

/// Hashes the UTF-8 bytes of a string.
#[inline]
#[must_use]
pub fn hash_str(value: &str) -> u32 {
    hash_bytes(value.as_bytes())
}

/// Hashes a `u32` through its little-endian bytes.
#[inline]
#[must_use]
pub fn hash_u32(value: u32) -> u32 {
    hash_bytes(&value.to_le_bytes())
}

/// Hashes a `u64` through its little-endian bytes.
#[inline]
#[must_use]
pub fn hash_u64(value: u64) -> u32 {
    hash_bytes(&value.to_le_bytes())
}

/// Hashes an `f32` through its bit pattern, so `0.0` and `-0.0` differ.
#[inline]
#[must_use]
pub fn hash_f32(value: f32) -> u32 {
    hash_u32(value.to_bits())
}

/// Incremental builder folding heterogeneous values into one content hash.
///
/// ```
/// use strata_core::hash::ContentHasher;
///
/// let a = ContentHasher::new().write_str("opaque").write_u32(3).finish();
/// let b = ContentHasher::new().write_str("opaque").write_u32(3).finish();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ContentHasher {
    state: u32,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    /// Starts a new hash from the fixed seed.
    pub const fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }

    /// Folds an already computed hash or raw 32-bit value.
    pub const fn write_raw(self, value: u32) -> Self {
        Self {
            state: combine(self.state, value),
        }
    }

    /// Folds a `u32` value.
    pub fn write_u32(self, value: u32) -> Self {
        self.write_raw(hash_u32(value))
    }

    /// Folds a `u64` value.
    pub fn write_u64(self, value: u64) -> Self {
        self.write_raw(hash_u64(value))
    }

    /// Folds a `usize` value as 64 bits, so keys match across pointer widths.
    pub fn write_usize(self, value: usize) -> Self {
        self.write_u64(value as u64)
    }

    /// Folds an `f32` value by bit pattern.
    pub fn write_f32(self, value: f32) -> Self {
        self.write_raw(hash_f32(value))
    }

    /// Folds a boolean.
    pub fn write_bool(self, value: bool) -> Self {
        self.write_u32(u32::from(value))
    }

    /// Folds a string.
    pub fn write_str(self, value: &str) -> Self {
        self.write_raw(hash_str(value))
    }

    /// Folds a byte slice.
    pub fn write_bytes(self, value: &[u8]) -> Self {
        self.write_raw(hash_bytes(value))
    }

    /// Returns the accumulated hash.
    #[must_use]
    pub const fn finish(self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(hash_bytes(b""), 0x811c_9dc5);
        assert_eq!(hash_str("a"), 0xe40c_292c);
        assert_eq!(hash_str("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn combine_is_deterministic() {
        for (a, b) in [(0, 0), (1, 2), (0xdead_beef, 42), (u32::MAX, 7)] {
            assert_eq!(combine(a, b), combine(a, b));
        }
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = hash_str("render_targets");
        let b = hash_str("viewport");
        assert_ne!(a, b);
        assert_ne!(combine(a, b), combine(b, a));
        assert_ne!(combine(1, 2), combine(2, 1));
    }

    #[test]
    fn hasher_distinguishes_field_order() {
        let ab = ContentHasher::new().write_u32(1).write_u32(2).finish();
        let ba = ContentHasher::new().write_u32(2).write_u32(1).finish();
        assert_ne!(ab, ba);
    }

    #[test]
    fn float_hash_uses_bit_pattern() {
        assert_ne!(hash_f32(0.0), hash_f32(-0.0));
        assert_eq!(hash_f32(1.5), hash_f32(1.5));
    }

    #[test]
    fn bool_fields_change_the_hash() {
        let on = ContentHasher::new().write_bool(true).finish();
        let off = ContentHasher::new().write_bool(false).finish();
        assert_ne!(on, off);
    }
}
