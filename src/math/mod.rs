//! Mathematical utilities: discrete derivatives and least squares.

pub mod diff;
pub mod ols;

pub use diff::*;
pub use ols::*;
