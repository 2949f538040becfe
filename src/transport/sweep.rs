//! Reduce whole measurement sweeps into curves versus in-plane field.

use tracing::{debug, info, warn};

use crate::domain::{
    Amperes, Branch, CurveKind, CurvePoint, DerivedCurve, DrCurve, ExtractConfig, FieldSlice, MeasurementSweep,
    SliceFailure, SweepExtraction, Thresholds,
};
use crate::error::ExtractError;
use crate::math::midpoints;
use crate::transport::extractor::{critical_current, differential_resistance, ic_rn_product, normal_resistance};

/// Parameters of one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    pub thresholds: Thresholds,
    pub branch: Branch,
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            branch: config.branch,
        }
    }
}

/// Apply every reduction to every field slice of `sweep`.
///
/// Slices that fail a reduction are kept in `failures` and logged; the other
/// reductions of the same slice still run. `IcRn` is only produced where both
/// `Ic` and `Rn` succeeded.
pub fn extract_sweep(sweep: &MeasurementSweep, opts: &ExtractOptions) -> SweepExtraction {
    let mut out = SweepExtraction {
        gate: sweep.gate.clone(),
        ic: DerivedCurve::new(CurveKind::Ic),
        rn: DerivedCurve::new(CurveKind::Rn),
        ic_rn: DerivedCurve::new(CurveKind::IcRn),
        failures: Vec::new(),
        dr: Vec::with_capacity(sweep.slices.len()),
    };

    for slice in &sweep.slices {
        let mut fail = |curve: CurveKind, error: ExtractError| {
            warn!(
                gate = %sweep.gate,
                field_t = slice.field.value(),
                ?curve,
                "{error}"
            );
            out.failures.push(SliceFailure {
                field: slice.field,
                curve,
                error,
            });
        };

        match differential_resistance(&slice.bias, &slice.scaled_voltage) {
            Ok(dr) => out.dr.push(DrCurve {
                field: slice.field,
                bias_mid: midpoints(&slice.bias),
                dr,
            }),
            Err(e) => fail(CurveKind::DvDi, e),
        }

        let ic = critical_current(&slice.bias, &slice.scaled_voltage, opts.thresholds.ic_voltage, opts.branch)
            .map_err(|e| fail(CurveKind::Ic, e))
            .ok();
        let rn = normal_resistance(&slice.bias, &slice.scaled_voltage, opts.thresholds.high_bias)
            .map_err(|e| fail(CurveKind::Rn, e))
            .ok();

        debug!(
            gate = %sweep.gate,
            field_t = slice.field.value(),
            n = slice.bias.len(),
            ic_a = ic.map(Amperes::value),
            rn_ohm = rn.map(|r| r.value()),
            "reduced slice"
        );

        if let Some(ic) = ic {
            out.ic.points.push(point(slice, ic.value()));
        }
        if let Some(rn) = rn {
            out.rn.points.push(point(slice, rn.value()));
        }
        if let (Some(ic), Some(rn)) = (ic, rn) {
            out.ic_rn.points.push(point(slice, ic_rn_product(ic, rn).value()));
        }
    }

    info!(
        gate = %sweep.gate,
        slices = sweep.slices.len(),
        ic = out.ic.len(),
        rn = out.rn.len(),
        failures = out.failures.len(),
        "extracted sweep"
    );

    out
}

/// Extract every sweep of a run, in input order.
pub fn extract_all(sweeps: &[MeasurementSweep], opts: &ExtractOptions) -> Vec<SweepExtraction> {
    sweeps.iter().map(|s| extract_sweep(s, opts)).collect()
}

fn point(slice: &FieldSlice, value: f64) -> CurvePoint {
    CurvePoint {
        field: slice.field,
        value,
    }
}
