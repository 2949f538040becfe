//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during extraction
//! - exported to JSON/CSV
//! - reloaded later for reporting or external plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{Amperes, FieldAxis, FieldUnit, Magnet, Tesla, Volts};
use crate::error::ExtractError;

/// Which side of the bias sweep the critical current is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// Larger of the positive and negative switching currents.
    Both,
    Positive,
    Negative,
}

/// Quantity held by a `DerivedCurve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Ic,
    Rn,
    IcRn,
    /// Per-slice differential resistance; only appears in `SliceFailure`.
    DvDi,
}

/// Operator thresholds for the reductions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// `|V|` must stay strictly below this for a bias to count as superconducting.
    pub ic_voltage: Volts,
    /// Samples with `|bias| >=` this enter the normal-resistance fit.
    pub high_bias: Amperes,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ic_voltage: Volts(1e-4),
            high_bias: Amperes(10e-6),
        }
    }
}

/// One parsed input row.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub gate: String,
    pub field: Tesla,
    pub bias: f64,
    pub scaled_voltage: f64,
}

/// All samples recorded at one in-plane field value.
///
/// Bias is in amperes and strictly monotonic; scaled voltage is in volts.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlice {
    pub field: Tesla,
    pub bias: Vec<f64>,
    pub scaled_voltage: Vec<f64>,
}

/// Field slices recorded at one gate voltage, ordered by ascending field.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSweep {
    pub gate: String,
    pub slices: Vec<FieldSlice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub field: Tesla,
    pub value: f64,
}

/// A scalar reduced from each bias sweep, as a function of in-plane field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCurve {
    pub kind: CurveKind,
    pub points: Vec<CurvePoint>,
}

impl DerivedCurve {
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
        }
    }

    /// Value at exactly `field`, if that slice produced one.
    pub fn value_at(&self, field: Tesla) -> Option<f64> {
        self.points.iter().find(|p| p.field == field).map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Differential resistance of one field slice, sampled at bias midpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct DrCurve {
    pub field: Tesla,
    pub bias_mid: Vec<f64>,
    pub dr: Vec<f64>,
}

/// A field slice for which a reduction failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceFailure {
    pub field: Tesla,
    pub curve: CurveKind,
    pub error: ExtractError,
}

/// Everything derived from one `MeasurementSweep`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepExtraction {
    pub gate: String,
    pub ic: DerivedCurve,
    pub rn: DerivedCurve,
    pub ic_rn: DerivedCurve,
    pub failures: Vec<SliceFailure>,
    /// Not part of the curves file; exported separately as CSV.
    #[serde(skip)]
    pub dr: Vec<DrCurve>,
}

impl SweepExtraction {
    /// Field values of every reduced or failed slice, sorted and deduplicated.
    pub fn fields(&self) -> Vec<Tesla> {
        let mut fields: Vec<Tesla> = self
            .ic
            .points
            .iter()
            .chain(self.rn.points.iter())
            .map(|p| p.field)
            .chain(self.failures.iter().map(|f| f.field))
            .collect();
        fields.sort_by(|a, b| a.0.total_cmp(&b.0));
        fields.dedup();
        fields
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, the optional run file and defaults.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub data_path: PathBuf,
    pub sample: String,
    /// Gate label used when the input has no gate column.
    pub gate: String,

    pub field_axis: FieldAxis,
    pub field_unit: FieldUnit,
    pub magnet: Option<Magnet>,
    /// Fields closer than this (tesla) are merged into one slice.
    pub field_tolerance: f64,
    /// Amplifier gain dividing `voltage_drop` into scaled voltage.
    pub amp_gain: f64,

    pub thresholds: Thresholds,
    pub branch: Branch,

    pub out_dir: Option<PathBuf>,
    pub quiet: bool,
}

/// A saved curves file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvesFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub sample: String,
    pub field_axis: FieldAxis,
    pub thresholds: Thresholds,
    pub branch: Branch,
    pub sweeps: Vec<SweepExtraction>,
}
