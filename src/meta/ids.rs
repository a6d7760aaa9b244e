//! Arena identifiers for global type nodes.

use std::fmt;

/// Index of a [`TypeNode`](super::TypeNode) in one generation's arena.
///
/// Ids are assigned in first-seen merge order. They are only meaningful
/// within the generation that produced them, except that two generations
/// with an identical code table assign identical ids, which is what lets
/// the resolver reuse unchanged hierarchies.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Create a new TypeId.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

impl From<u32> for TypeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_index() {
        let id = TypeId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(TypeId::from(7), id);
        assert_eq!(format!("{:?}", id), "TypeId(7)");
    }

    #[test]
    fn test_type_id_size() {
        assert_eq!(std::mem::size_of::<TypeId>(), 4);
        assert_eq!(std::mem::size_of::<Option<TypeId>>(), 8);
    }
}
