//! Command-line parsing for the junction transport extractor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the extraction code. Every extraction flag is optional so
//! that a run file section can fill it in; defaults live in `config`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{Branch, FieldAxis, FieldUnit, Magnet};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "jj", version, about = "Josephson-junction Ic / Rn / IcRn extraction versus in-plane field")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` also applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract Ic, Rn and IcRn versus in-plane field from a measurement CSV.
    Extract(ExtractArgs),
    /// Print the report of a previously exported curves JSON.
    Show(ShowArgs),
    /// Write a synthetic junction measurement in the input CSV schema.
    Simulate(SimulateArgs),
}

/// Options for `jj extract`.
#[derive(Debug, Parser, Clone, Default)]
pub struct ExtractArgs {
    /// Measurement CSV. May be omitted when the run file section sets `data`.
    #[arg(value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// TOML run file with a `[default]` table and named sections.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Section of the run file to use.
    #[arg(long, requires = "config")]
    pub section: Option<String>,

    /// |V| below this (volts) counts as superconducting.
    #[arg(long, value_name = "VOLTS")]
    pub ic_voltage_threshold: Option<f64>,

    /// |bias| at or above this (amperes) enters the normal-resistance fit.
    #[arg(long, value_name = "AMPS")]
    pub high_bias_threshold: Option<f64>,

    /// Bias branch for the critical current.
    #[arg(long, value_enum)]
    pub branch: Option<Branch>,

    /// Amplifier gain dividing `voltage_drop` into scaled voltage.
    #[arg(long)]
    pub amp_gain: Option<f64>,

    /// In-plane field axis of the vector magnet.
    #[arg(long, value_enum)]
    pub field_axis: Option<FieldAxis>,

    /// Unit of the field column.
    #[arg(long, value_enum)]
    pub field_unit: Option<FieldUnit>,

    /// Magnet calibration used with `--field-unit amps`.
    #[arg(long, value_enum)]
    pub magnet: Option<Magnet>,

    /// Fields closer than this (tesla) belong to one slice.
    #[arg(long, value_name = "TESLA")]
    pub field_tolerance: Option<f64>,

    /// Gate label used when the CSV has no gate column.
    #[arg(long)]
    pub gate: Option<String>,

    /// Sample name used in output file names (defaults to the CSV stem).
    #[arg(long)]
    pub sample: Option<String>,

    /// Directory for JSON/CSV exports. Nothing is written without it.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Do not print the report.
    #[arg(long, short)]
    pub quiet: bool,
}

/// Options for `jj show`.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Curves JSON file produced by `jj extract --out-dir`.
    #[arg(value_name = "JSON")]
    pub curves: PathBuf,
}

/// Options for `jj simulate`.
#[derive(Debug, Parser)]
pub struct SimulateArgs {
    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Gate label written to every row.
    #[arg(long, default_value = "0V")]
    pub gate: String,

    /// Zero-field critical current (A).
    #[arg(long, default_value_t = 2e-6)]
    pub ic0: f64,

    /// Normal resistance (Ω).
    #[arg(long, default_value_t = 150.0)]
    pub rn: f64,

    /// In-plane field scale of the Ic suppression (T).
    #[arg(long, default_value_t = 0.3)]
    pub b0: f64,

    /// Field sweep half-range (T).
    #[arg(long, default_value_t = 0.5)]
    pub field_max: f64,

    /// Number of field slices.
    #[arg(long, default_value_t = 11)]
    pub field_steps: usize,

    /// Bias sweep half-range (A).
    #[arg(long, default_value_t = 8e-6)]
    pub bias_max: f64,

    /// Samples per bias sweep.
    #[arg(long, default_value_t = 161)]
    pub bias_steps: usize,

    /// Voltage noise standard deviation (V).
    #[arg(long, default_value_t = 1e-7)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
