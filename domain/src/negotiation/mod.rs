//! Deterministic multi-dimensional negotiation.
//!
//! An issue can be decomposed into independent [`Dimension`]s (a numeric
//! range or a set of options). The [`NegotiationEngine`] has every
//! [`Negotiator`] propose a value per dimension from its weight profile,
//! then concedes on the most contested dimension until the proposals agree
//! or the round cap forces a median compromise.

pub mod dimension;
pub mod engine;

pub use dimension::{Dimension, DimensionKind, DimensionValue};
pub use engine::{
    Concession, EngineRound, NegotiationEngine, NegotiationOutcome, Negotiator, SettlementStatus,
};
