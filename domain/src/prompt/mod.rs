//! Prompt domain
//!
//! Templates for every request council actors make to the reasoning service.

mod council;

pub use council::CouncilPromptTemplate;
