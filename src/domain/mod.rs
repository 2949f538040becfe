//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - SI unit newtypes (`Amperes`, `Volts`, `Ohms`, `Tesla`)
//! - magnet calibrations (`Magnet`, `FieldAxis`)
//! - measurement input (`MeasurementSweep`, `FieldSlice`)
//! - extraction outputs (`DerivedCurve`, `SweepExtraction`, `CurvesFile`)

pub mod magnet;
pub mod types;
pub mod units;

pub use magnet::*;
pub use types::*;
pub use units::*;
