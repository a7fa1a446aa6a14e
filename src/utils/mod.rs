//! Generic utility primitives with zero domain knowledge.
//!
//! - `suggest` - Alias suggestion for unrecognized names

pub mod suggest;
