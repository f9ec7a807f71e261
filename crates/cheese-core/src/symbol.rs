//! Deterministic identities for mangled symbols.
//!
//! A [`SymbolHash`] is the xxh64 hash of a mangled name, mixed with a domain
//! constant so that function and global identities never collide even when
//! their mangled spelling does.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
pub mod hash_constants {
    /// Domain marker for concrete function symbols.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;
    /// Domain marker for top-level variable symbols.
    pub const GLOBAL: u64 = 0x2fac10b63a6cc57c;
}

/// 64-bit identity of a mangled symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolHash(pub u64);

impl SymbolHash {
    /// Hash of a concrete function's mangled name.
    #[inline]
    pub fn function(mangled: &str) -> Self {
        SymbolHash(xxh64(mangled.as_bytes(), hash_constants::FUNCTION))
    }

    /// Hash of a top-level variable's mangled name.
    #[inline]
    pub fn global(mangled: &str) -> Self {
        SymbolHash(xxh64(mangled.as_bytes(), hash_constants::GLOBAL))
    }
}

impl fmt::Debug for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolHash({:#018x})", self.0)
    }
}

impl fmt::Display for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
