//! Reading input schema
//!
//! This module turns caller-supplied readings into a validated window the
//! engine can evaluate. It supports JSON arrays (batch) and NDJSON (one
//! reading per line).

mod adapter;
mod window;

pub use adapter::*;
pub use window::*;
