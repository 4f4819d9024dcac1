//! Resource layout module
//!
//! Indexing of dynamic uniform offsets, binding groups, texture bindings and
//! pipelines, plus the arena holding a scene's binding groups.

mod indexer;
mod binding_arena;

pub use indexer::{align_up, ResourceLayoutIndexer, SceneMode};
pub use binding_arena::BindingArena;
