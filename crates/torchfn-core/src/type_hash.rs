//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a qualified name. Because the
//! same name always yields the same hash, a type can be referenced (for
//! example as the configured base domain type) before it is registered.
//!
//! # Examples
//!
//! ```
//! use torchfn_core::TypeHash;
//!
//! let a = TypeHash::from_name("Tensor");
//! let b = TypeHash::from_name("Tensor");
//! assert_eq!(a, b);
//!
//! // Operations live in their own hash domain.
//! assert_ne!(TypeHash::from_operation("Tensor"), a);
//! ```

use std::fmt;

use xxhash_rust::const_xxh64::xxh64 as const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// Types and operations sharing a name still produce distinct hashes.
pub mod hash_constants {
    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for operation (public API function) hashes
    pub const OPERATION: u64 = 0x5ea77ffbcdf5f302;
}

/// A deterministic 64-bit hash identifying a type or an operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// `const` twin of [`TypeHash::from_name`], used for the built-in table.
    ///
    /// Both produce identical values for the same input.
    #[inline]
    pub const fn from_name_const(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64(name.as_bytes(), 0))
    }

    /// Create a hash for a public operation name (e.g. `"torch.add"`).
    #[inline]
    pub fn from_operation(name: &str) -> Self {
        TypeHash(hash_constants::OPERATION ^ xxh64(name.as_bytes(), 0))
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

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl Default for TypeHash {
    fn default() -> Self {
        Self::EMPTY
    }
}
