//! Property-based tests for the model builder and inheritance resolver.
//!
//! Declaration sets are generated with arbitrary (possibly dangling or
//! cyclic) `extends` links and overlapping attribute qualifiers, spread over
//! several modules.
#![cfg(feature = "proptest")]

use std::sync::Arc;

use indexmap::IndexMap;
use proptest::prelude::*;
use typesys::base::{FileId, ModuleId};
use typesys::decl::{adapt_file, DeclarationGroup, RawAttribute, RawDeclaration, RawFile};
use typesys::meta::HierarchyStatus;
use typesys::{GlobalTypeModel, MergeOrder, ModelConfig, TypeSystemHost};

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

const CODES: [&str; 6] = ["Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta"];
const QUALIFIERS: [&str; 4] = ["code", "name", "owner", "status"];

fn arb_code() -> impl Strategy<Value = &'static str> {
    prop::sample::select(CODES.to_vec())
}

/// Parent codes include one that is never declared.
fn arb_parent() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        2 => Just(None),
        4 => arb_code().prop_map(Some),
        1 => Just(Some("Missing")),
    ]
}

fn arb_declaration() -> impl Strategy<Value = RawDeclaration> {
    (
        arb_code(),
        arb_parent(),
        prop::collection::vec((prop::sample::select(QUALIFIERS.to_vec()), "[A-Z][a-z]{1,6}"), 0..3),
    )
        .prop_map(|(code, parent, attributes)| {
            attributes
                .into_iter()
                .fold(RawDeclaration::item(code, parent), |decl, (qualifier, type_ref)| {
                    decl.with_attribute(RawAttribute::new(qualifier, &type_ref))
                })
        })
}

fn arb_groups() -> impl Strategy<Value = Vec<Arc<DeclarationGroup>>> {
    prop::collection::vec(prop::collection::vec(arb_declaration(), 1..5), 1..4).prop_map(|files| {
        files
            .iter()
            .enumerate()
            .map(|(i, declarations)| {
                Arc::new(adapt_file(FileId::new(i as u32), ModuleId::new(i as u32), declarations))
            })
            .collect()
    })
}

fn arb_files() -> impl Strategy<Value = Vec<Vec<RawDeclaration>>> {
    prop::collection::vec(prop::collection::vec(arb_declaration(), 1..5), 1..4)
}

fn raw_file(index: usize, declarations: Vec<RawDeclaration>) -> RawFile {
    RawFile {
        path: format!("/module{}/items.xml", index),
        module: format!("module{}", index),
        custom: index > 0,
        declarations,
    }
}

/// Merged own attributes per code: last declaration wins per qualifier.
fn own_attributes(groups: &[Arc<DeclarationGroup>], code: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    for declaration in groups.iter().flat_map(|group| &group.declarations) {
        if declaration.code == code {
            for attribute in declaration.attributes() {
                attributes.insert(attribute.qualifier.to_string(), attribute.type_ref.to_string());
            }
        }
    }
    attributes
}

proptest! {
    #[test]
    fn prop_build_is_idempotent(groups in arb_groups()) {
        let first = GlobalTypeModel::from_groups(&groups, ModelConfig::default());
        let second = GlobalTypeModel::from_groups(&groups, ModelConfig::default());
        prop_assert!(first.same_nodes(&second));
    }

    #[test]
    fn prop_all_attributes_follow_ancestor_chain(groups in arb_groups()) {
        let model = GlobalTypeModel::from_groups(&groups, ModelConfig::default());
        let access = model.access();

        for item in access.all_of_kind(typesys::decl::TypeKind::Item) {
            let code = item.code();
            let hierarchy = access.hierarchy(code).expect("item types are resolved");
            if hierarchy.status == HierarchyStatus::Cycle {
                // only own members survive on a cycle
                prop_assert_eq!(hierarchy.ancestors.len(), 1);
                continue;
            }

            let mut expected = IndexMap::new();
            for ancestor in access.ancestors(code) {
                for (qualifier, type_ref) in own_attributes(&groups, ancestor.code()) {
                    expected.insert(qualifier, type_ref);
                }
            }
            let actual: IndexMap<String, String> = hierarchy
                .all_attributes
                .values()
                .map(|a| (a.qualifier.to_string(), a.type_ref.to_string()))
                .collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(hierarchy.ancestors.last().copied(), Some(item.node().id));
        }
    }

    #[test]
    fn prop_descendants_exclude_self(groups in arb_groups()) {
        let model = GlobalTypeModel::from_groups(&groups, ModelConfig::default());
        for node in model.nodes() {
            prop_assert!(!model.descendants(node.id).contains(&node.id));
        }
    }

    #[test]
    fn prop_incremental_rebuild_matches_full_build(
        files in arb_files(),
        edits in prop::collection::vec((0usize..4, prop::collection::vec(arb_declaration(), 1..5)), 1..4),
    ) {
        let host = TypeSystemHost::default();
        let count = files.len();
        for (index, declarations) in files.into_iter().enumerate() {
            host.set_file(&raw_file(index, declarations));
        }
        prop_assert!(host.rebuild().is_ok());

        for (index, declarations) in edits {
            host.set_file(&raw_file(index % count, declarations));
            prop_assert!(host.rebuild().is_ok());

            let groups = host.with_sources(|sources| sources.groups_in_merge_order(MergeOrder::LoadOrder));
            let full = GlobalTypeModel::from_groups(&groups, ModelConfig::default().with_incremental(false));
            prop_assert!(host.snapshot().same_nodes(&full));
        }
    }
}
