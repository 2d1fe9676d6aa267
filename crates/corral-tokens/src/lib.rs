//! # corral-tokens
//!
//! Token counting via `tiktoken-rs` (`cl100k_base`), cached per blake3
//! content hash, and rank-ordered packing for context panes.

pub mod budget;
pub mod counter;

pub use budget::{Packed, PackedLine, TokenBudget};
pub use counter::TokenCounter;
