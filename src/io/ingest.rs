//! CSV ingest and normalization.
//!
//! This module is responsible for turning a flat export of the acquisition
//! datasets into clean `MeasurementSweep`s that are safe to reduce.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic grouping** into gate sweeps and field slices
//! - **Separation of concerns**: no extraction logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{ExtractConfig, FieldAxis, FieldSlice, FieldUnit, MeasurementSweep, SweepPoint, Tesla};
use crate::error::AppError;

const FIELD_ALIASES: [&str; 2] = ["field", "inplane_field"];
const BIAS_ALIASES: [&str; 2] = ["bias", "current bias"];
const SCALED_ALIASES: [&str; 2] = ["scaled_voltage", "scaledvoltage"];
const RAW_ALIASES: [&str; 2] = ["voltage_drop", "voltage drop"];
const GATE_ALIASES: [&str; 3] = ["gate", "gate_voltage", "gate voltage"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// A field slice rejected while grouping.
#[derive(Debug, Clone)]
pub struct SliceError {
    pub gate: String,
    pub field: Tesla,
    pub message: String,
}

/// Summary stats about the samples actually used.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_sweeps: usize,
    pub n_slices: usize,
    pub field_min: f64,
    pub field_max: f64,
    pub bias_min: f64,
    pub bias_max: f64,
}

/// Ingest output: grouped sweeps + stats + rejected rows and slices.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub sweeps: Vec<MeasurementSweep>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub slice_errors: Vec<SliceError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoltageColumn {
    Scaled(usize),
    /// Raw voltage drop, divided by the amplifier gain.
    Raw(usize),
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    field: usize,
    bias: usize,
    voltage: VoltageColumn,
    gate: Option<usize>,
}

/// Load the CSV named by `config.data_path` and group it into sweeps.
pub fn load_sweeps(config: &ExtractConfig) -> Result<IngestedData, AppError> {
    let file = File::open(&config.data_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", config.data_path.display()),
        )
    })?;
    load_sweeps_from_reader(file, config)
}

/// Same as `load_sweeps`, reading from any source.
pub fn load_sweeps_from_reader<R: Read>(source: R, config: &ExtractConfig) -> Result<IngestedData, AppError> {
    if !(config.amp_gain.is_finite() && config.amp_gain > 0.0) {
        return Err(AppError::new(2, "Amplifier gain must be finite and > 0."));
    }
    if !(config.field_tolerance.is_finite() && config.field_tolerance >= 0.0) {
        return Err(AppError::new(2, "Field tolerance must be finite and >= 0."));
    }
    if config.field_unit == FieldUnit::Amps && config.magnet.is_none() {
        return Err(AppError::new(
            2,
            "`--field-unit amps` requires `--magnet` to convert coil current to tesla.",
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map, config.field_axis)?;
    if header_map.contains_key("dr") {
        debug!("ignoring `dr` column; differential resistance is re-derived");
    }

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns, config) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = points.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after parsing."));
    }

    let (sweeps, slice_errors) = group_sweeps(points, config.field_tolerance);
    let stats = compute_stats(&sweeps)
        .ok_or_else(|| AppError::new(3, "No usable field slice remains after grouping."))?;

    info!(
        rows_read,
        rows_used,
        sweeps = stats.n_sweeps,
        slices = stats.n_slices,
        "ingested measurement"
    );

    Ok(IngestedData {
        sweeps,
        stats,
        row_errors,
        slice_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM on the first header so schema lookups still match.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn resolve_columns(header_map: &HashMap<String, usize>, axis: FieldAxis) -> Result<Columns, AppError> {
    let magnet_channel = format!("vector magnet - field {}", axis.label());
    let field = find_column(header_map, &FIELD_ALIASES)
        .or_else(|| header_map.get(&magnet_channel).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("Missing required field column: `field` or `{magnet_channel}`"),
            )
        })?;

    let bias = find_column(header_map, &BIAS_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `bias`"))?;

    let voltage = match (
        find_column(header_map, &SCALED_ALIASES),
        find_column(header_map, &RAW_ALIASES),
    ) {
        (Some(idx), raw) => {
            if raw.is_some() {
                debug!("both scaled and raw voltage present; using scaled voltage");
            }
            VoltageColumn::Scaled(idx)
        }
        (None, Some(idx)) => VoltageColumn::Raw(idx),
        (None, None) => {
            return Err(AppError::new(
                2,
                "Missing voltage column: need `scaled_voltage` or `voltage_drop`.",
            ));
        }
    };

    Ok(Columns {
        field,
        bias,
        voltage,
        gate: find_column(header_map, &GATE_ALIASES),
    })
}

fn parse_row(record: &StringRecord, columns: &Columns, config: &ExtractConfig) -> Result<SweepPoint, String> {
    let raw_field = parse_required(record, columns.field, "field")?;
    let field = match (config.field_unit, config.magnet) {
        (FieldUnit::Tesla, _) => Tesla(raw_field),
        (FieldUnit::Amps, Some(magnet)) => magnet.coil_current_to_field(config.field_axis, raw_field),
        (FieldUnit::Amps, None) => return Err("Coil current given without a magnet calibration.".to_string()),
    };

    let bias = parse_required(record, columns.bias, "bias")?;
    let scaled_voltage = match columns.voltage {
        VoltageColumn::Scaled(idx) => parse_required(record, idx, "scaled_voltage")?,
        VoltageColumn::Raw(idx) => parse_required(record, idx, "voltage_drop")? / config.amp_gain,
    };

    let gate = columns
        .gate
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(config.gate.as_str())
        .to_string();

    Ok(SweepPoint {
        gate,
        field,
        bias,
        scaled_voltage,
    })
}

fn parse_required(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let s = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

/// Group points by gate (first-appearance order), then by field.
///
/// Points within `tolerance` of the first field of a slice are merged into it;
/// the slice field is the mean of the merged values. Slices whose bias is not
/// strictly monotonic are rejected.
fn group_sweeps(points: Vec<SweepPoint>, tolerance: f64) -> (Vec<MeasurementSweep>, Vec<SliceError>) {
    let mut gate_order: Vec<String> = Vec::new();
    let mut by_gate: HashMap<String, Vec<SweepPoint>> = HashMap::new();
    for p in points {
        if !by_gate.contains_key(&p.gate) {
            gate_order.push(p.gate.clone());
        }
        by_gate.entry(p.gate.clone()).or_default().push(p);
    }

    let mut sweeps = Vec::with_capacity(gate_order.len());
    let mut errors = Vec::new();

    for gate in gate_order {
        let mut gate_points = by_gate.remove(&gate).unwrap_or_default();
        // Stable: rows of one slice keep their acquisition order.
        gate_points.sort_by(|a, b| a.field.0.total_cmp(&b.field.0));

        let mut slices = Vec::new();
        let mut start = 0;
        while start < gate_points.len() {
            let anchor = gate_points[start].field.0;
            let mut end = start + 1;
            while end < gate_points.len() && gate_points[end].field.0 - anchor <= tolerance {
                end += 1;
            }

            let group = &gate_points[start..end];
            let field = Tesla(group.iter().map(|p| p.field.0).sum::<f64>() / group.len() as f64);
            let slice = FieldSlice {
                field,
                bias: group.iter().map(|p| p.bias).collect(),
                scaled_voltage: group.iter().map(|p| p.scaled_voltage).collect(),
            };

            if is_strictly_monotonic(&slice.bias) {
                slices.push(slice);
            } else {
                errors.push(SliceError {
                    gate: gate.clone(),
                    field,
                    message: "Bias is not strictly monotonic within the slice.".to_string(),
                });
            }
            start = end;
        }

        if !slices.is_empty() {
            sweeps.push(MeasurementSweep { gate, slices });
        }
    }

    (sweeps, errors)
}

fn is_strictly_monotonic(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0]) || values.windows(2).all(|w| w[1] < w[0])
}

fn compute_stats(sweeps: &[MeasurementSweep]) -> Option<DatasetStats> {
    let mut field_min = f64::INFINITY;
    let mut field_max = f64::NEG_INFINITY;
    let mut bias_min = f64::INFINITY;
    let mut bias_max = f64::NEG_INFINITY;
    let mut n_slices = 0;

    for slice in sweeps.iter().flat_map(|s| s.slices.iter()) {
        n_slices += 1;
        field_min = field_min.min(slice.field.0);
        field_max = field_max.max(slice.field.0);
        for &b in &slice.bias {
            bias_min = bias_min.min(b);
            bias_max = bias_max.max(b);
        }
    }

    if n_slices == 0 || !field_min.is_finite() || !bias_min.is_finite() {
        return None;
    }

    Some(DatasetStats {
        n_sweeps: sweeps.len(),
        n_slices,
        field_min,
        field_max,
        bias_min,
        bias_max,
    })
}
