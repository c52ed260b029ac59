//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod actor;
pub mod actor_manager;
pub mod run_workflow;
pub mod shared_store;

#[cfg(test)]
pub(crate) mod test_support;
