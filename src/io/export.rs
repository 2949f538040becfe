//! Export derived curves to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or plotting scripts.
//! All values are in SI units (T, A, Ω, V). Every CSV this crate writes goes
//! through `csv_writer`, so free-text labels such as gate names get quoted.

use std::fs::File;
use std::path::Path;

use crate::domain::SweepExtraction;
use crate::error::AppError;

/// Open a CSV writer on `path`; `what` names the file in error messages.
pub(crate) fn csv_writer(path: &Path, what: &str) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create {what} '{}': {e}", path.display())))
}

/// Write one record, mapping failures to an output error.
pub(crate) fn write_row<I, T>(writer: &mut csv::Writer<File>, what: &str, record: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|e| AppError::new(4, format!("Failed to write {what} row: {e}")))
}

/// Flush buffered rows to disk.
pub(crate) fn finish(mut writer: csv::Writer<File>, what: &str) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write {what}: {e}")))
}

/// Write `Ic`, `Rn` and `IcRn` versus field for one gate sweep.
///
/// One row per field slice; a reduction that failed leaves its cell empty.
pub fn write_curves_csv(path: &Path, extraction: &SweepExtraction) -> Result<(), AppError> {
    const WHAT: &str = "export CSV";
    let mut writer = csv_writer(path, WHAT)?;

    write_row(&mut writer, WHAT, ["gate", "field_t", "ic_a", "rn_ohm", "icrn_v"])?;

    let cell = |v: Option<f64>| v.map(|v| format!("{v:.10e}")).unwrap_or_default();
    for field in extraction.fields() {
        write_row(
            &mut writer,
            WHAT,
            [
                extraction.gate.clone(),
                format!("{:.10e}", field.value()),
                cell(extraction.ic.value_at(field)),
                cell(extraction.rn.value_at(field)),
                cell(extraction.ic_rn.value_at(field)),
            ],
        )?;
    }

    finish(writer, WHAT)
}

/// Write the `dV/dI` curve of every slice of one gate sweep (long format).
pub fn write_dr_csv(path: &Path, extraction: &SweepExtraction) -> Result<(), AppError> {
    const WHAT: &str = "dV/dI CSV";
    let mut writer = csv_writer(path, WHAT)?;

    write_row(&mut writer, WHAT, ["gate", "field_t", "bias_mid_a", "dr_ohm"])?;

    for curve in &extraction.dr {
        let field = format!("{:.10e}", curve.field.value());
        for (bias, dr) in curve.bias_mid.iter().zip(&curve.dr) {
            let bias = format!("{bias:.10e}");
            let dr = format!("{dr:.10e}");
            write_row(
                &mut writer,
                WHAT,
                [extraction.gate.as_str(), field.as_str(), bias.as_str(), dr.as_str()],
            )?;
        }
    }

    finish(writer, WHAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveKind, CurvePoint, DerivedCurve, DrCurve, SliceFailure, Tesla};
    use crate::error::ExtractError;

    fn curve(kind: CurveKind, points: &[(f64, f64)]) -> DerivedCurve {
        DerivedCurve {
            kind,
            points: points
                .iter()
                .map(|&(field, value)| CurvePoint {
                    field: Tesla(field),
                    value,
                })
                .collect(),
        }
    }

    fn extraction() -> SweepExtraction {
        SweepExtraction {
            gate: "Vg=1,5".to_string(),
            ic: curve(CurveKind::Ic, &[(0.0, 1e-5)]),
            rn: curve(CurveKind::Rn, &[(0.0, 100.0), (0.1, 110.0)]),
            ic_rn: curve(CurveKind::IcRn, &[(0.0, 1e-3)]),
            failures: vec![SliceFailure {
                field: Tesla(0.1),
                curve: CurveKind::Ic,
                error: ExtractError::ThresholdNotFound { threshold: 1e-4 },
            }],
            dr: vec![DrCurve {
                field: Tesla(0.0),
                bias_mid: vec![0.5e-6, 1.5e-6],
                dr: vec![0.0, 100.0],
            }],
        }
    }

    #[test]
    fn curves_csv_leaves_failed_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icrn.csv");
        write_curves_csv(&path, &extraction()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "gate,field_t,ic_a,rn_ohm,icrn_v");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("\"Vg=1,5\",0.0000000000e0,1.0000000000e-5,"));
        assert!(lines[2].ends_with(",,1.1000000000e2,"), "{}", lines[2]);
    }

    #[test]
    fn dr_csv_is_long_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dr.csv");
        write_dr_csv(&path, &extraction()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Vg=1,5");
        let dr: f64 = rows[1][3].parse().unwrap();
        assert_eq!(dr, 100.0);
    }

    #[test]
    fn awkward_gate_labels_survive_a_csv_reader() {
        let gate = "Vg \"sweep\"\r\n-1V";
        let sweep = SweepExtraction {
            gate: gate.to_string(),
            ..extraction()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icrn.csv");
        write_curves_csv(&path, &sweep).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], gate);
        assert_eq!(rows[0].len(), 5);
    }
}
