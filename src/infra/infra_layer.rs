// The infra module contains implementations of core traits.
// Each backend goes in its own submodule.

#[path = "memory/mod.rs"]
pub mod memory;

#[path = "google/mod.rs"]
pub mod google;
