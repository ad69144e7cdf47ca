//! Model export for external solvers.

pub mod lp;

pub use lp::write_lp;
