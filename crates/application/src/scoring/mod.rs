//! Scoring module - per-question correctness
//!
//! Multiple-choice answers are compared exactly; free-response answers are
//! compared numerically within an absolute tolerance.

mod engine;
mod rules;

pub use engine::*;
pub use rules::*;
