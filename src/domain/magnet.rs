//! Superconducting magnet calibrations.
//!
//! Some acquisition setups log the magnet power-supply current rather than
//! the field itself. The coil constants below convert that current into
//! tesla for each fridge magnet and axis.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Tesla;

/// Field axis of a vector magnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FieldAxis {
    X,
    Y,
    Z,
}

impl FieldAxis {
    pub fn label(self) -> &'static str {
        match self {
            FieldAxis::X => "x",
            FieldAxis::Y => "y",
            FieldAxis::Z => "z",
        }
    }
}

/// Magnet the field channel was recorded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Magnet {
    /// Single-axis 14 T solenoid (the axis is ignored).
    FourteenTesla,
    Vector9,
    Vector10,
}

impl Magnet {
    /// Coil current per unit field (A/T).
    pub fn amps_per_tesla(self, axis: FieldAxis) -> f64 {
        match (self, axis) {
            (Magnet::FourteenTesla, _) => 8.341,
            (Magnet::Vector9, FieldAxis::X) => 35.705,
            (Magnet::Vector9, FieldAxis::Y) => 72.575,
            (Magnet::Vector9, FieldAxis::Z) => 18.203,
            (Magnet::Vector10, FieldAxis::X) => 35.927,
            (Magnet::Vector10, FieldAxis::Y) => 74.548,
            (Magnet::Vector10, FieldAxis::Z) => 18.011,
        }
    }

    pub fn coil_current_to_field(self, axis: FieldAxis, amps: f64) -> Tesla {
        Tesla(amps / self.amps_per_tesla(axis))
    }
}

/// Unit of the field column in the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FieldUnit {
    Tesla,
    /// Magnet coil current; requires a `Magnet` to convert.
    Amps,
}
