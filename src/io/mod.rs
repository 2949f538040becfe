//! Input/output helpers.
//!
//! - CSV ingest + grouping into sweeps (`ingest`)
//! - derived-curve CSV exports (`export`)
//! - curves JSON read/write (`curve`)
//! - output file naming (`naming`)

pub mod curve;
pub mod export;
pub mod ingest;
pub mod naming;

pub use curve::*;
pub use export::*;
pub use ingest::*;
pub use naming::*;
