//! IDE features — consumers of the global type model.
//!
//! Everything here reads a published [`GlobalTypeModel`](crate::meta::GlobalTypeModel)
//! generation and returns plain data; editor protocol types are converted
//! at the integration boundary.
//!
//! ## Usage
//!
//! ```ignore
//! use typesys::ide::{member_completions, TypeSystemChecker};
//! use typesys::state::TypeSystemHost;
//!
//! let host = TypeSystemHost::default();
//! host.set_files(&files);
//! host.rebuild()?;
//!
//! let model = host.snapshot();
//! let members = member_completions(&model, "Product");
//! let findings = TypeSystemChecker::new(&model).check_group(&group);
//! ```

mod completion;
mod inspections;
mod model_render;

pub use completion::{
    member_completions, subtype_completions, type_code_completions, CompletionItem, CompletionKind,
};
pub use inspections::{file_diagnostics, Check, TypeSystemChecker};
pub use model_render::{render_fields, type_code_for_class, RenderedField, RenderedMember};
