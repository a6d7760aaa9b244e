//! Global Type Model — merge, inheritance resolution and queries.
//!
//! ```text
//! DeclarationGroup*  (in merge order)
//!     ↓ builder::merge        one TypeNode per code, merge diagnostics
//!     ↓ inherit::resolve      Hierarchy per item type (full or per subtree)
//! GlobalTypeModel           immutable generation, arena indexed by TypeId
//!     ↓ TypeAccess            read-only facade
//! consumers (ide::*)
//! ```

mod access;
mod builder;
mod diagnostics;
mod ids;
mod inherit;
mod model;
mod node;

pub use access::{is_truthy, property_string, TypeAccess};
pub use builder::build_model;
pub use diagnostics::{codes, Diagnostic, DiagnosticCollector, RelatedInfo, Severity};
pub use ids::TypeId;
pub use inherit::ChangeScope;
pub use model::GlobalTypeModel;
pub use node::{
    Attribute, AttributeMap, Classifier, CollectionType, EnumType, EnumValue, Hierarchy,
    HierarchyStatus, Index, IndexMapByName, ItemType, MapType, NodeData, NodeRef, RelationEnd,
    RelationSide, RelationType, TypeNode,
};
