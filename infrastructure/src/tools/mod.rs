//! Deterministic policy analysis tools
//!
//! Pure functions of a [`PolicyCard`](council_domain::PolicyCard) exposed to
//! the reasoning service through [`PolicyToolExecutor`].

pub mod policy;

mod executor;

pub use executor::PolicyToolExecutor;
pub use policy::policy_tool_schemas;
