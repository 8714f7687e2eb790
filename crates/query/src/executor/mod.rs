//! Expression evaluation and pump program execution.

mod eval;
mod project;

pub use eval::{evaluate, evaluate_predicate};
