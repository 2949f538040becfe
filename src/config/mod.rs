//! Run configuration: CLI flags layered over an optional TOML run file.
//!
//! A run file holds one table per measurement plus an optional `[default]`
//! table shared by all of them:
//!
//! ```toml
//! [default]
//! data_dir = "/data/fridge"
//! field_axis = "y"
//! ic_voltage_threshold = 1e-4
//!
//! [JS512-cd3]
//! data = "2023/JS512_cd3_inplane.csv"
//! high_bias_threshold = 8e-6
//! ```
//!
//! Precedence is CLI flag > named section > `[default]` > built-in default.
//! Relative `data` paths from the run file resolve against `data_dir`, then
//! the `JJ_DATA_DIR` environment variable (`.env` is honoured).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::cli::ExtractArgs;
use crate::domain::{Amperes, Branch, ExtractConfig, FieldAxis, FieldUnit, Magnet, Thresholds, Volts};
use crate::error::AppError;

const DEFAULT_SECTION: &str = "default";
const DATA_DIR_ENV: &str = "JJ_DATA_DIR";
const DEFAULT_FIELD_TOLERANCE: f64 = 1e-9;

/// One table of the run file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunProfile {
    pub data: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub sample: Option<String>,
    pub gate: Option<String>,
    pub field_axis: Option<FieldAxis>,
    pub field_unit: Option<FieldUnit>,
    pub magnet: Option<Magnet>,
    pub field_tolerance: Option<f64>,
    pub amp_gain: Option<f64>,
    /// Volts.
    pub ic_voltage_threshold: Option<f64>,
    /// Amperes.
    pub high_bias_threshold: Option<f64>,
    pub branch: Option<Branch>,
    pub out_dir: Option<PathBuf>,
}

impl RunProfile {
    /// Keys set in `self` win; unset keys fall back to `base`.
    pub fn overlay(self, base: RunProfile) -> RunProfile {
        RunProfile {
            data: self.data.or(base.data),
            data_dir: self.data_dir.or(base.data_dir),
            sample: self.sample.or(base.sample),
            gate: self.gate.or(base.gate),
            field_axis: self.field_axis.or(base.field_axis),
            field_unit: self.field_unit.or(base.field_unit),
            magnet: self.magnet.or(base.magnet),
            field_tolerance: self.field_tolerance.or(base.field_tolerance),
            amp_gain: self.amp_gain.or(base.amp_gain),
            ic_voltage_threshold: self.ic_voltage_threshold.or(base.ic_voltage_threshold),
            high_bias_threshold: self.high_bias_threshold.or(base.high_bias_threshold),
            branch: self.branch.or(base.branch),
            out_dir: self.out_dir.or(base.out_dir),
        }
    }
}

/// Parse run file text and select a section merged over `[default]`.
pub fn parse_run_file(text: &str, section: Option<&str>) -> Result<RunProfile, AppError> {
    let mut tables: BTreeMap<String, RunProfile> =
        toml::from_str(text).map_err(|e| AppError::new(2, format!("Invalid run file: {e}")))?;

    let default = tables.remove(DEFAULT_SECTION).unwrap_or_default();
    let Some(name) = section else {
        return Ok(default);
    };

    match tables.remove(name) {
        Some(profile) => Ok(profile.overlay(default)),
        None => {
            let available: Vec<&str> = tables.keys().map(String::as_str).collect();
            Err(AppError::new(
                2,
                format!(
                    "Section `{name}` not found in run file (available: {}).",
                    if available.is_empty() { "none".to_string() } else { available.join(", ") }
                ),
            ))
        }
    }
}

/// Load and select a run file section from disk.
pub fn load_run_file(path: &Path, section: Option<&str>) -> Result<RunProfile, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read run file '{}': {e}", path.display())))?;
    debug!(path = %path.display(), section, "loaded run file");
    parse_run_file(&text, section)
}

/// Data directory from the environment (`.env` first).
pub fn data_dir_from_env() -> Option<PathBuf> {
    dotenvy::dotenv().ok();
    std::env::var_os(DATA_DIR_ENV).map(PathBuf::from)
}

/// Build the extraction config from CLI flags and the optional run file.
pub fn resolve_extract_config(args: &ExtractArgs) -> Result<ExtractConfig, AppError> {
    let profile = match &args.config {
        Some(path) => load_run_file(path, args.section.as_deref())?,
        None => RunProfile::default(),
    };
    let env_dir = if args.data.is_none() && profile.data_dir.is_none() {
        data_dir_from_env()
    } else {
        None
    };
    build_config(args, profile, env_dir)
}

/// Pure part of `resolve_extract_config`.
pub fn build_config(args: &ExtractArgs, profile: RunProfile, env_dir: Option<PathBuf>) -> Result<ExtractConfig, AppError> {
    let data_path = match (&args.data, &profile.data) {
        (Some(cli), _) => cli.clone(),
        (None, Some(rel)) => match profile.data_dir.clone().or(env_dir) {
            Some(dir) if rel.is_relative() => dir.join(rel),
            _ => rel.clone(),
        },
        (None, None) => {
            return Err(AppError::new(
                2,
                "No measurement CSV given (pass a path or set `data` in the run file section).",
            ));
        }
    };

    let sample = args
        .sample
        .clone()
        .or(profile.sample)
        .or_else(|| data_path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "sample".to_string());

    let ic_voltage = args
        .ic_voltage_threshold
        .or(profile.ic_voltage_threshold)
        .unwrap_or(Thresholds::default().ic_voltage.value());
    let high_bias = args
        .high_bias_threshold
        .or(profile.high_bias_threshold)
        .unwrap_or(Thresholds::default().high_bias.value());
    check_non_negative("ic_voltage_threshold", ic_voltage)?;
    check_non_negative("high_bias_threshold", high_bias)?;

    let field_tolerance = args
        .field_tolerance
        .or(profile.field_tolerance)
        .unwrap_or(DEFAULT_FIELD_TOLERANCE);
    check_non_negative("field_tolerance", field_tolerance)?;

    let amp_gain = args.amp_gain.or(profile.amp_gain).unwrap_or(1.0);
    if !(amp_gain.is_finite() && amp_gain > 0.0) {
        return Err(AppError::new(2, format!("Invalid amp_gain {amp_gain}: must be finite and > 0.")));
    }

    Ok(ExtractConfig {
        data_path,
        sample,
        gate: args.gate.clone().or(profile.gate).unwrap_or_else(|| "0V".to_string()),
        field_axis: args.field_axis.or(profile.field_axis).unwrap_or(FieldAxis::Y),
        field_unit: args.field_unit.or(profile.field_unit).unwrap_or(FieldUnit::Tesla),
        magnet: args.magnet.or(profile.magnet),
        field_tolerance,
        amp_gain,
        thresholds: Thresholds {
            ic_voltage: Volts(ic_voltage),
            high_bias: Amperes(high_bias),
        },
        branch: args.branch.or(profile.branch).unwrap_or(Branch::Both),
        out_dir: args.out_dir.clone().or(profile.out_dir),
        quiet: args.quiet,
    })
}

fn check_non_negative(name: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppError::new(2, format!("Invalid {name} {value}: must be finite and >= 0.")))
    }
}
