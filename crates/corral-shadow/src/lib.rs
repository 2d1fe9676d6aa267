//! # corral-shadow
//!
//! Derives semantic records and graph nodes/edges from committed writes.
//!
//! Propagation is detached from the writer: it starts after the primary
//! write has returned, retries with capped exponential backoff, and drops
//! into a dead-letter ring on exhaustion. Nothing here can fail a write.

pub mod dead_letter;
pub mod graph;
pub mod mapping;
pub mod propagator;
pub mod retry;
pub mod semantic;

pub use dead_letter::{DeadLetter, DeadLetterSink};
pub use graph::GraphStore;
pub use mapping::{ShadowMapping, ShadowPlan};
pub use propagator::{PropagationOutcome, ShadowPropagator};
pub use retry::RetryPolicy;
pub use semantic::InMemorySemanticStore;
