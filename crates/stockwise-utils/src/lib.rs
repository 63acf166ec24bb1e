//! Shared utilities for stockwise
//!
//! Holds the pieces every binary in the workspace sets up the same way.

pub mod logging;

pub use logging::{init_tracing, init_tracing_with};
