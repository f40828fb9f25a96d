//! Identifier types for searchpool
//!
//! This module provides type-safe wrapper types for ULID-based identifiers
//! used throughout searchpool to prevent mixing different kinds of
//! identifiers at compile time.
//!
//! [`ExecutionId`] names one logical unit of work (one request or job) and is
//! the key under which a [`crate::SearcherProvider`] tracks connections and
//! borrowed cursors. It replaces an ambient current-thread identity: callers
//! pass it explicitly through the call chain, which keeps provider state
//! testable and independent of the threading model.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

/// Type-safe identity of one logical unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ExecutionId(u128);

/// Type-safe identity of a borrowed result cursor
///
/// The provider tracks cursors only by identity for idle detection; it never
/// inspects the cursor contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CursorId(u128);

/// Type-safe identity of an indexed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DocumentId(u128);

impl ExecutionId {
    /// Generate a new ULID-based execution identifier
    pub fn new() -> Self {
        Self(Ulid::new().0)
    }

    /// Create an ExecutionId from a ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.0)
    }

    /// Convert to ULID
    pub fn as_ulid(self) -> Ulid {
        Ulid(self.0)
    }
}

impl CursorId {
    /// Generate a new ULID-based cursor identifier
    pub fn new() -> Self {
        Self(Ulid::new().0)
    }

    /// Create a CursorId from a ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.0)
    }

    /// Convert to ULID
    pub fn as_ulid(self) -> Ulid {
        Ulid(self.0)
    }
}

impl DocumentId {
    /// Generate a new ULID-based document identifier
    pub fn new() -> Self {
        Self(Ulid::new().0)
    }

    /// Create a DocumentId from a ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.0)
    }

    /// Convert to ULID
    pub fn as_ulid(self) -> Ulid {
        Ulid(self.0)
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for CursorId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ExecutionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ulid())
    }
}

impl Display for CursorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ulid())
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ulid())
    }
}

impl FromStr for ExecutionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_str(s).map(Self::from_ulid)
    }
}

impl FromStr for CursorId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_str(s).map(Self::from_ulid)
    }
}

impl FromStr for DocumentId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_str(s).map(Self::from_ulid)
    }
}
