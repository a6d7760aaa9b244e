//! Declaration input — from parsed source files to Local Declarations.
//!
//! ```text
//! external parser → RawFile / RawDeclaration
//!     ↓ adapt_file (pure, per file)
//! DeclarationGroup (LocalDeclaration*, parse diagnostics)
//!     ↓ SourceSet::set_group (wholesale replace per file)
//! merge input for the model builder
//! ```

mod adapter;
mod raw;
mod source;
mod types;

pub use adapter::{adapt_file, adapt_files, LOCALIZED_PREFIX};
pub use raw::{
    RawAttribute, RawDeclaration, RawEnumValue, RawFile, RawIndex, RawModifiers, RawRange,
    RawRelationEnd,
};
pub use source::{ModuleInfo, SourceSet};
pub use types::{
    Cardinality, CollectionKind, CustomProperties, DeclBody, DeclarationGroup, EnumValueDecl,
    LocalAttribute, LocalDeclaration, LocalIndex, Modifiers, PersistenceKind, Provenance,
    RelationEndDecl, TypeKind,
};
