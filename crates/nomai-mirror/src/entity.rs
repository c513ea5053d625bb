//! Remote entity identifiers.
//!
//! An [`EntityId`] is the 64-bit handle the remote world uses for its
//! entities: a *generation* counter in the high 32 bits and an *index* in the
//! low 32 bits. The mirror never allocates ids and never assumes an index is
//! not reused; it only stores and formats them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A generational entity identifier, as sent by the remote world.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Read an entity reference out of a dynamic value.
    ///
    /// Entity references travel as bare numbers; anything else is not an
    /// entity.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(Self)
    }

    /// Ordering key that sorts by index first, then generation.
    #[inline]
    pub fn sort_key(self) -> (u32, u32) {
        (self.index(), self.generation())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::from(id.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
