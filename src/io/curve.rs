//! Read/write curves JSON files.
//!
//! The curves file is the portable representation of one extraction run:
//! - run metadata (sample, field axis, thresholds, branch, timestamp)
//! - per gate: `Ic`, `Rn` and `IcRn` versus in-plane field
//! - the slices that failed, with their typed error
//!
//! The schema is defined by `domain::CurvesFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurvesFile, ExtractConfig, SweepExtraction};
use crate::error::AppError;

/// Assemble the curves file for a finished run.
pub fn build_curves_file(config: &ExtractConfig, extractions: &[SweepExtraction]) -> CurvesFile {
    CurvesFile {
        tool: "jj".to_string(),
        generated_at: Utc::now(),
        sample: config.sample.clone(),
        field_axis: config.field_axis,
        thresholds: config.thresholds,
        branch: config.branch,
        sweeps: extractions.to_vec(),
    }
}

/// Write a curves JSON file.
pub fn write_curves_json(path: &Path, curves: &CurvesFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create curves JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curves)
        .map_err(|e| AppError::new(4, format!("Failed to write curves JSON: {e}")))?;

    Ok(())
}

/// Read a curves JSON file.
pub fn read_curves_json(path: &Path) -> Result<CurvesFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curves JSON '{}': {e}", path.display())))?;
    let curves: CurvesFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curves JSON: {e}")))?;
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Branch, CurveKind, CurvePoint, DerivedCurve, FieldAxis, SliceFailure, Tesla, Thresholds,
    };
    use crate::error::ExtractError;

    #[test]
    fn curves_file_survives_a_disk_round_trip() {
        let mut ic = DerivedCurve::new(CurveKind::Ic);
        ic.points.push(CurvePoint {
            field: Tesla(0.05),
            value: 2.5e-6,
        });
        let extraction = SweepExtraction {
            gate: "-2V".to_string(),
            ic,
            rn: DerivedCurve::new(CurveKind::Rn),
            ic_rn: DerivedCurve::new(CurveKind::IcRn),
            failures: vec![SliceFailure {
                field: Tesla(0.05),
                curve: CurveKind::Rn,
                error: ExtractError::InsufficientData { needed: 2, got: 0 },
            }],
            dr: Vec::new(),
        };
        let curves = CurvesFile {
            tool: "jj".to_string(),
            generated_at: Utc::now(),
            sample: "JS512".to_string(),
            field_axis: FieldAxis::Y,
            thresholds: Thresholds::default(),
            branch: Branch::Positive,
            sweeps: vec![extraction.clone()],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.json");
        write_curves_json(&path, &curves).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"kind\": \"insufficient_data\""), "{text}");

        let back = read_curves_json(&path).unwrap();
        assert_eq!(back.sample, "JS512");
        assert_eq!(back.branch, Branch::Positive);
        assert_eq!(back.sweeps, vec![extraction]);
    }

    #[test]
    fn unreadable_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_curves_json(&path).unwrap_err().exit_code(), 2);
    }
}
