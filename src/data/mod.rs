//! Synthetic measurement data.

pub mod synth;

pub use synth::*;
