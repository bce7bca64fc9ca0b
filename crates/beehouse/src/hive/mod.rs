// Hive Composition Module
//
// This module models the physical hive:
// - Identities for hives, extensions, frames and external references
// - The base/extension container hierarchy and its slot invariants
// - Frame lifecycle transitions driven by weight
// - A lock-guarded handle for concurrent mutation

mod beehive;
mod container;
mod frame;
mod frame_state;
mod ids;
mod shared;
mod structure;

#[cfg(test)]
mod frame_state_property_tests;

pub use beehive::*;
pub use container::*;
pub use frame::*;
pub use frame_state::*;
pub use ids::*;
pub use shared::*;
pub use structure::*;
