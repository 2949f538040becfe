//! Shared extraction pipeline used by `jj extract`.
//!
//! CSV ingest -> grouping into sweeps -> per-slice reductions -> exports
//!
//! The CLI handler only decides what to print; everything computed lives here.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{ExtractConfig, SweepExtraction};
use crate::error::AppError;
use crate::io::curve::{build_curves_file, write_curves_json};
use crate::io::export::{write_curves_csv, write_dr_csv};
use crate::io::ingest::{IngestedData, load_sweeps};
use crate::io::naming::{output_path, output_stem};
use crate::transport::{ExtractOptions, extract_all};

/// All computed outputs of a single `jj extract` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub extractions: Vec<SweepExtraction>,
}

impl RunOutput {
    /// Number of curve points produced across all gates.
    pub fn n_points(&self) -> usize {
        self.extractions
            .iter()
            .map(|e| e.ic.len() + e.rn.len() + e.ic_rn.len())
            .sum()
    }
}

/// Load the configured CSV and run every reduction.
pub fn run_extraction(config: &ExtractConfig) -> Result<RunOutput, AppError> {
    let ingest = load_sweeps(config)?;
    run_extraction_on(ingest, config)
}

/// Run the reductions on already-ingested data.
///
/// Fails with exit code 3 when not a single slice produced a curve point.
pub fn run_extraction_on(ingest: IngestedData, config: &ExtractConfig) -> Result<RunOutput, AppError> {
    let opts = ExtractOptions::from(config);
    let extractions = extract_all(&ingest.sweeps, &opts);

    let run = RunOutput { ingest, extractions };
    if run.n_points() == 0 {
        return Err(AppError::new(
            3,
            "No field slice produced Ic or Rn; check the thresholds and the bias range.",
        ));
    }
    Ok(run)
}

/// Write the curves JSON and the per-gate CSVs into `out_dir`.
///
/// Returns the written paths in write order.
pub fn write_outputs(
    out_dir: &Path,
    config: &ExtractConfig,
    extractions: &[SweepExtraction],
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| AppError::new(4, format!("Failed to create output dir '{}': {e}", out_dir.display())))?;

    let mut written = Vec::with_capacity(1 + 2 * extractions.len());

    let stem = output_stem(&config.sample, config.field_axis, None);
    let json = output_path(out_dir, &stem, "curves.json");
    write_curves_json(&json, &build_curves_file(config, extractions))?;
    written.push(json);

    for extraction in extractions {
        let stem = output_stem(&config.sample, config.field_axis, Some(&extraction.gate));

        let curves = output_path(out_dir, &stem, "icrn.csv");
        write_curves_csv(&curves, extraction)?;
        written.push(curves);

        let dr = output_path(out_dir, &stem, "dr.csv");
        write_dr_csv(&dr, extraction)?;
        written.push(dr);
    }

    info!(dir = %out_dir.display(), files = written.len(), "wrote exports");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SynthConfig, generate_sweep, write_sweep_csv};
    use crate::domain::{Amperes, Branch, FieldAxis, FieldUnit, Thresholds, Volts};

    fn config(data_path: PathBuf) -> ExtractConfig {
        ExtractConfig {
            data_path,
            sample: "JS512-cd3".to_string(),
            gate: "0V".to_string(),
            field_axis: FieldAxis::Y,
            field_unit: FieldUnit::Tesla,
            magnet: None,
            field_tolerance: 1e-9,
            amp_gain: 1.0,
            thresholds: Thresholds {
                ic_voltage: Volts(5e-5),
                high_bias: Amperes(5e-6),
            },
            branch: Branch::Both,
            out_dir: None,
            quiet: true,
        }
    }

    #[test]
    fn synthetic_run_recovers_the_model_and_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("synth.csv");
        let synth = SynthConfig {
            field_steps: 5,
            noise: 0.0,
            ..SynthConfig::default()
        };
        write_sweep_csv(&csv, &generate_sweep(&synth).unwrap()).unwrap();

        let config = config(csv);
        let run = run_extraction(&config).unwrap();
        assert_eq!(run.extractions.len(), 1);

        let sweep = &run.extractions[0];
        assert_eq!(sweep.gate, "0V");
        assert_eq!(sweep.ic.len(), 5);
        assert_eq!(sweep.rn.len(), 5);
        // RSJ curvature above Ic pulls the fitted slope a few percent low.
        for p in &sweep.rn.points {
            assert!((p.value - synth.rn).abs() < 0.06 * synth.rn, "Rn {} at {:?}", p.value, p.field);
        }
        // Bias grid step is 0.1 µA, so Ic lands within one step of the model.
        let ic0 = sweep.ic.value_at(crate::domain::Tesla(0.0)).unwrap();
        assert!((ic0 - synth.ic0).abs() <= 0.11e-6, "Ic(0) {ic0}");

        let out = dir.path().join("out");
        let written = write_outputs(&out, &config, &run.extractions).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "JS512-cd3_By-inplane_curves.json",
                "JS512-cd3_By-inplane_Vg0V_icrn.csv",
                "JS512-cd3_By-inplane_Vg0V_dr.csv",
            ]
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn run_without_any_curve_point_is_no_usable_data() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("flat.csv");
        // Every voltage is above the Ic threshold and no bias reaches the Rn window.
        std::fs::write(&csv, "field,bias,scaled_voltage\n0,-1e-6,-1\n0,0,1\n0,1e-6,1\n").unwrap();

        let err = run_extraction(&config(csv)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
