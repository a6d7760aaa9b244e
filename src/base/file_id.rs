//! Identifiers for source files and the modules that own them.

use std::fmt;

/// An interned identifier for a declaration source file.
///
/// `FileId` is a lightweight handle (just a u32) assigned by the
/// [`SourceSet`](crate::decl::SourceSet). The path is stored there.
/// A file's declarations are replaced wholesale whenever the file changes,
/// so the id doubles as the provenance key for a declaration group.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId from a raw index.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl From<u32> for FileId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a source module (an extension contributing declarations).
///
/// Module ids are handed out in registration order, which is also the
/// default merge order: a higher id is merged later and wins on conflicts.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleId(pub u32);

impl ModuleId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_hash() {
        use rustc_hash::FxHashSet;

        let mut set = FxHashSet::default();
        set.insert(FileId::new(1));
        set.insert(FileId::new(2));
        set.insert(FileId::new(1));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_module_order_follows_registration() {
        assert!(ModuleId::new(0) < ModuleId::new(1));
        assert_eq!(format!("{}", ModuleId::new(3)), "module#3");
    }

    #[test]
    fn test_id_sizes() {
        assert_eq!(std::mem::size_of::<FileId>(), 4);
        assert_eq!(std::mem::size_of::<ModuleId>(), 4);
    }
}
