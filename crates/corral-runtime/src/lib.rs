//! # corral-runtime
//!
//! [`CoordinationEngine`] owns one instance of every component and exposes
//! the tool-facing operations: the gateway calls, `send`, `checkin`, and
//! `deregister`. There is no global: build one engine per service (or per
//! test) and share it by reference or `Arc`.

pub mod engine;
pub mod options;

pub use engine::CoordinationEngine;
pub use options::RuntimeOptions;
