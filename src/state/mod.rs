//! Invalidation and cache control.
//!
//! [`TypeSystemHost`] moves between two states:
//!
//! ```text
//!            declarations change
//!   Stable ───────────────────────► Rebuilding
//!     ▲                                 │
//!     └──── publish (generation + 1) ◄──┘
//! ```
//!
//! Readers always see the last published generation. Narrower caches key
//! their entries by generation through [`GenerationCache`].

mod cache;
mod host;

pub use cache::GenerationCache;
pub use host::{ChangeListener, ModelState, RebuildOutcome, TypeSystemHost};
