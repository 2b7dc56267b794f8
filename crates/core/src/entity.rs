//! Entity trait: identity + continuity across state changes.

use crate::id::{EntityId, EntityKind};

/// Business entity keyed by an allocator-issued [`EntityId`].
pub trait Entity {
    /// Entity type whose counter sequence and prefix this entity uses.
    const KIND: EntityKind;

    /// Returns the entity identifier.
    fn id(&self) -> &EntityId;
}
