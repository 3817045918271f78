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

//! A macro to define bitflag sets without pulling in an external crate.
//!
//! Used for vertex-element masks, buffer usage and the per-aspect dirty bits
//! of the context differ.

#[macro_export]
#[doc(hidden)]
macro_rules! strata_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Every named flag of this set.
            pub const ALL_NAMED: &'static [(&'static str, Self)] = &[
                $((stringify!($flag_name), Self::$flag_name),)*
            ];

            /// Builds a set from raw bits, keeping unknown bits.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Raw value of the set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if no bit is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if all flags in `other` are set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is set in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags in `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags in `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Sets or clears `other` depending on `value`.
            pub fn set(&mut self, other: Self, value: bool) {
                if value {
                    self.insert(other);
                } else {
                    self.remove(other);
                }
            }

            /// Number of bits set.
            pub const fn count(&self) -> u32 {
                self.bits.count_ones()
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                if self.bits == 0 {
                    return write!(f, "{}(EMPTY)", stringify!($name));
                }
                let mut remaining = self.bits;
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                for (label, flag) in Self::ALL_NAMED {
                    if flag.bits != 0 && remaining & flag.bits == flag.bits {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{label}")?;
                        remaining &= !flag.bits;
                        first = false;
                    }
                }
                if remaining != 0 {
                    if !first {
                        write!(f, " | ")?;
                    }
                    write!(f, "{:#x}", remaining)?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::strata_bitflags;

    strata_bitflags! {
        /// Channels of a fake vertex layout.
        pub struct Channels: u16 {
            const POSITION = 1 << 0;
            const NORMAL = 1 << 1;
            const UV = 1 << 2;
            const LIT = Self::POSITION.bits() | Self::NORMAL.bits();
        }
    }

    #[test]
    fn empty_set_reports_empty() {
        let c = Channels::default();
        assert!(c.is_empty());
        assert_eq!(c.count(), 0);
        assert_eq!(format!("{c:?}"), "Channels(EMPTY)");
    }

    #[test]
    fn combined_constant_contains_its_parts() {
        assert!(Channels::LIT.contains(Channels::POSITION));
        assert!(Channels::LIT.contains(Channels::NORMAL));
        assert!(!Channels::LIT.contains(Channels::UV));
        assert!(Channels::LIT.intersects(Channels::NORMAL | Channels::UV));
    }

    #[test]
    fn set_and_remove_toggle_bits() {
        let mut c = Channels::POSITION;
        c.set(Channels::UV, true);
        assert_eq!(c.bits(), 0b101);
        c.set(Channels::POSITION, false);
        assert_eq!(c, Channels::UV);
        c.remove(Channels::UV);
        assert!(c.is_empty());
    }

    #[test]
    fn debug_lists_named_then_unknown_bits() {
        let c = Channels::UV | Channels::from_bits_truncate(1 << 8);
        assert_eq!(format!("{c:?}"), "Channels(UV | 0x100)");
        assert_eq!(format!("{:?}", Channels::LIT), "Channels(POSITION | NORMAL)");
    }
}
