//! Transport curve extraction.
//!
//! - single-sweep reductions: `dV/dI`, `Ic`, `Rn`, `IcRn` (`extractor`)
//! - whole-sweep driver producing curves versus in-plane field (`sweep`)

pub mod extractor;
pub mod sweep;

pub use extractor::*;
pub use sweep::*;
