//! Deterministic hash-based symbol identity.
//!
//! [`SymbolHash`] is a 64-bit hash identifying a type or a method. Methods are
//! keyed by identity rather than by name alone: overloads share a name but
//! differ in their parameter types, so the hash mixes both.
//!
//! # Examples
//!
//! ```
//! use sable_core::SymbolHash;
//!
//! let a = SymbolHash::from_method(None, "print", &["int"]);
//! let b = SymbolHash::from_method(None, "print", &["string"]);
//! assert_ne!(a, b);
//! assert_eq!(a, SymbolHash::from_method(None, "print", &["int"]));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant used to chain components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for free function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for member method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Parameter position mixing constants, so parameter order matters.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type or method.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolHash(pub u64);

impl SymbolHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: SymbolHash = SymbolHash(0);

    /// Create a hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        SymbolHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a method hash from its optional owner, name and parameter type names.
    ///
    /// Free functions and members use different domain markers so that a
    /// function `f` never collides with a method `T::f`.
    #[inline]
    pub fn from_method(owner: Option<&str>, name: &str, param_types: &[&str]) -> Self {
        let mut hash = match owner {
            Some(owner) => {
                hash_constants::METHOD ^ Self::from_name(owner).0 ^ xxh64(name.as_bytes(), 0)
            }
            None => hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0),
        };
        for (i, param) in param_types.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the mix non-commutative
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ xxh64(param.as_bytes(), 0));
        }
        SymbolHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolHash({:#018x})", self.0)
    }
}

impl fmt::Display for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_is_deterministic() {
        assert_eq!(SymbolHash::from_name("Point"), SymbolHash::from_name("Point"));
        assert_ne!(SymbolHash::from_name("Point"), SymbolHash::from_name("Vector"));
    }

    #[test]
    fn parameter_order_matters() {
        let a = SymbolHash::from_method(None, "f", &["int", "string"]);
        let b = SymbolHash::from_method(None, "f", &["string", "int"]);
        assert_ne!(a, b);
    }

    #[test]
    fn owner_distinguishes_methods() {
        let free = SymbolHash::from_method(None, "len", &[]);
        let member = SymbolHash::from_method(Some("List"), "len", &[]);
        assert_ne!(free, member);
    }

    #[test]
    fn many_parameters_still_hash() {
        let names = ["int"; 12];
        let a = SymbolHash::from_method(None, "wide", &names);
        let b = SymbolHash::from_method(None, "wide", &names[..11]);
        assert_ne!(a, b);
    }
}
