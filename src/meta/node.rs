//! Global type nodes — the merged, queryable representation of one type code.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Location;
use crate::decl::{
    Cardinality, CollectionKind, CustomProperties, LocalAttribute, LocalIndex, Modifiers,
    PersistenceKind, Provenance, RelationEndDecl, TypeKind,
};

use super::diagnostics::Diagnostic;
use super::ids::TypeId;

/// Attributes keyed by qualifier, in first-declared order.
pub type AttributeMap = IndexMap<SmolStr, Arc<Attribute>>;
/// Indexes keyed by name.
pub type IndexMapByName = IndexMap<SmolStr, Arc<Index>>;

// ============================================================================
// MEMBERS
// ============================================================================

/// A merged attribute of an item type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub qualifier: SmolStr,
    /// Value type code; empty when unknown.
    pub type_ref: SmolStr,
    pub localized: bool,
    pub persistence: PersistenceKind,
    pub modifiers: Modifiers,
    pub handler: Option<SmolStr>,
    pub default_value: Option<SmolStr>,
    pub custom_properties: CustomProperties,
    /// Code of the item type that declares this attribute.
    pub owner: SmolStr,
    pub location: Location,
}

impl Attribute {
    pub(crate) fn from_local(owner: &SmolStr, local: &LocalAttribute) -> Self {
        Self {
            qualifier: local.qualifier.clone(),
            type_ref: local.type_ref.clone(),
            localized: local.localized,
            persistence: local.persistence,
            modifiers: local.modifiers,
            handler: local.handler.clone(),
            default_value: local.default_value.clone(),
            custom_properties: local.custom_properties.clone(),
            owner: owner.clone(),
            location: local.location,
        }
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.modifiers.unique
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.persistence == PersistenceKind::Dynamic
    }
}

/// A merged index of an item type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    pub name: SmolStr,
    pub keys: Vec<SmolStr>,
    pub unique: bool,
    pub owner: SmolStr,
    pub location: Location,
}

impl Index {
    pub(crate) fn from_local(owner: &SmolStr, local: &LocalIndex) -> Self {
        Self {
            name: local.name.clone(),
            keys: local.keys.clone(),
            unique: local.unique,
            owner: owner.clone(),
            location: local.location,
        }
    }
}

/// Which side of its relation an end is declared on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationSide {
    Source,
    Target,
}

impl RelationSide {
    pub fn opposite(self) -> Self {
        match self {
            RelationSide::Source => RelationSide::Target,
            RelationSide::Target => RelationSide::Source,
        }
    }
}

/// A relation end as seen from the item type it is navigable from.
///
/// For relation `R(source S, target T)`, `S` sees R's target end (whose
/// `type_code` is `T`) and `T` sees R's source end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationEnd {
    /// Code of the declaring relation.
    pub relation: SmolStr,
    pub side: RelationSide,
    /// Type reached by navigating this end.
    pub type_code: SmolStr,
    /// Type this end is navigable from (the opposite end's type).
    pub owner: SmolStr,
    pub qualifier: Option<SmolStr>,
    pub cardinality: Cardinality,
    pub ordering: Vec<SmolStr>,
    pub collection_kind: Option<CollectionKind>,
    pub navigable: bool,
    pub modifiers: Modifiers,
    pub location: Location,
}

impl RelationEnd {
    pub(crate) fn new(relation: &SmolStr, side: RelationSide, end: &RelationEndDecl, owner: &SmolStr) -> Self {
        Self {
            relation: relation.clone(),
            side,
            type_code: end.type_code.clone(),
            owner: owner.clone(),
            qualifier: end.qualifier.clone(),
            cardinality: end.cardinality,
            ordering: end.ordering.clone(),
            collection_kind: end.collection_kind,
            navigable: end.navigable,
            modifiers: end.modifiers,
            location: end.location,
        }
    }

    #[inline]
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// One enumeration literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub code: SmolStr,
    /// Where the value was first declared.
    pub location: Location,
}

// ============================================================================
// KIND-SPECIFIC DATA
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemType {
    pub parent: Option<SmolStr>,
    /// Where the winning `extends` was declared.
    pub parent_location: Option<Location>,
    /// Own attributes merged across modules (no inheritance).
    pub attributes: AttributeMap,
    pub indexes: IndexMapByName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumType {
    pub values: IndexMap<SmolStr, EnumValue>,
    pub dynamic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationType {
    pub source: RelationEndDecl,
    pub target: RelationEndDecl,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionType {
    pub element_type: SmolStr,
    pub collection_kind: CollectionKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapType {
    pub argument_type: SmolStr,
    pub return_type: SmolStr,
}

/// Kind-specific content of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Item(ItemType),
    Enum(EnumType),
    Relation(RelationType),
    Collection(CollectionType),
    Map(MapType),
}

impl NodeData {
    pub fn kind(&self) -> TypeKind {
        match self {
            NodeData::Item(_) => TypeKind::Item,
            NodeData::Enum(_) => TypeKind::Enum,
            NodeData::Relation(_) => TypeKind::Relation,
            NodeData::Collection(_) => TypeKind::Collection,
            NodeData::Map(_) => TypeKind::Map,
        }
    }
}

// ============================================================================
// HIERARCHY
// ============================================================================

/// Outcome of resolving an item type's `extends` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HierarchyStatus {
    Complete,
    /// The chain stops at a parent code that is unknown or not an item type.
    Incomplete { missing: SmolStr },
    /// The node is on, or leads into, an `extends` cycle.
    Cycle,
}

/// Inheritance-resolved view of one item type.
///
/// Hierarchies are immutable and shared between generations when a node's
/// whole chain is untouched by an edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    pub status: HierarchyStatus,
    /// Root first, ending with the node itself.
    pub ancestors: Vec<TypeId>,
    /// Own attributes over ancestor attributes, keyed by qualifier.
    pub all_attributes: AttributeMap,
    pub all_indexes: IndexMapByName,
    /// Relation ends whose opposite end is bound to exactly this type.
    pub own_relation_ends: Vec<Arc<RelationEnd>>,
    /// Ancestor relation ends followed by own ones.
    pub all_relation_ends: Vec<Arc<RelationEnd>>,
    pub all_custom_properties: CustomProperties,
    /// Structural findings for this node (cycles, unresolved parent, overrides).
    pub diagnostics: Vec<Diagnostic>,
}

impl Hierarchy {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.status == HierarchyStatus::Complete
    }

    #[inline]
    pub fn is_cycle(&self) -> bool {
        self.status == HierarchyStatus::Cycle
    }
}

// ============================================================================
// TYPE NODE
// ============================================================================

/// One canonical node per type code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNode {
    pub id: TypeId,
    pub code: SmolStr,
    pub data: NodeData,
    /// Own custom properties merged across modules.
    pub custom_properties: CustomProperties,
    /// Location of the declaration whose kind won.
    pub location: Location,
    /// Every declaration that contributed, in merge order.
    pub provenance: Vec<Provenance>,
    /// Set for item types once the resolver ran.
    pub hierarchy: Option<Arc<Hierarchy>>,
}

impl TypeNode {
    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.data.kind()
    }

    pub fn as_item(&self) -> Option<&ItemType> {
        match &self.data {
            NodeData::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.data {
            NodeData::Enum(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationType> {
        match &self.data {
            NodeData::Relation(data) => Some(data),
            _ => None,
        }
    }

    /// Merged content that the resolver depends on.
    pub(crate) fn same_content(&self, other: &TypeNode) -> bool {
        self.data == other.data && self.custom_properties == other.custom_properties
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// A node together with its kind-specific data.
pub struct NodeRef<'m, T> {
    pub node: &'m TypeNode,
    pub data: &'m T,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("code", &self.node.code)
            .field("data", self.data)
            .finish()
    }
}

impl<'m, T> NodeRef<'m, T> {
    #[inline]
    pub fn id(&self) -> TypeId {
        self.node.id
    }

    #[inline]
    pub fn code(&self) -> &'m str {
        &self.node.code
    }
}

impl<'m> NodeRef<'m, ItemType> {
    pub fn hierarchy(&self) -> Option<&'m Hierarchy> {
        self.node.hierarchy.as_deref()
    }
}

/// Whichever of the five kinds a code denotes.
#[derive(Clone, Copy, Debug)]
pub enum Classifier<'m> {
    Item(NodeRef<'m, ItemType>),
    Enum(NodeRef<'m, EnumType>),
    Relation(NodeRef<'m, RelationType>),
    Collection(NodeRef<'m, CollectionType>),
    Map(NodeRef<'m, MapType>),
}

impl<'m> Classifier<'m> {
    pub fn of(node: &'m TypeNode) -> Self {
        match &node.data {
            NodeData::Item(data) => Classifier::Item(NodeRef { node, data }),
            NodeData::Enum(data) => Classifier::Enum(NodeRef { node, data }),
            NodeData::Relation(data) => Classifier::Relation(NodeRef { node, data }),
            NodeData::Collection(data) => Classifier::Collection(NodeRef { node, data }),
            NodeData::Map(data) => Classifier::Map(NodeRef { node, data }),
        }
    }

    pub fn node(&self) -> &'m TypeNode {
        match self {
            Classifier::Item(r) => r.node,
            Classifier::Enum(r) => r.node,
            Classifier::Relation(r) => r.node,
            Classifier::Collection(r) => r.node,
            Classifier::Map(r) => r.node,
        }
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.node().kind()
    }

    #[inline]
    pub fn code(&self) -> &'m str {
        &self.node().code
    }
}
