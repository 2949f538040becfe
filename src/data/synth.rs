//! Synthetic junction sweeps for demos and tests.
//!
//! Each field slice follows the resistively-shunted junction I–V curve
//!
//! `V(I) = sign(I) · Rn · sqrt(I² − Ic(B)²)` for `|I| > Ic(B)`, else `0`,
//!
//! with a Gaussian in-plane suppression `Ic(B) = Ic0 · exp(−(B/B0)²)` and
//! additive Gaussian voltage noise.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{SweepPoint, Tesla};
use crate::error::AppError;
use crate::io::export::{csv_writer, finish, write_row};

/// Parameters of a synthetic measurement.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub gate: String,
    /// Zero-field critical current (A).
    pub ic0: f64,
    /// Normal resistance (Ω).
    pub rn: f64,
    /// In-plane field scale of the Ic suppression (T).
    pub b0: f64,
    /// Field sweep `[-field_max, field_max]` (T).
    pub field_max: f64,
    pub field_steps: usize,
    /// Bias sweep `[-bias_max, bias_max]` (A).
    pub bias_max: f64,
    pub bias_steps: usize,
    /// Standard deviation of the voltage noise (V).
    pub noise: f64,
    /// Seeds `StdRng` as is; the noise depends on nothing else.
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            gate: "0V".to_string(),
            ic0: 2e-6,
            rn: 150.0,
            b0: 0.3,
            field_max: 0.5,
            field_steps: 11,
            bias_max: 8e-6,
            bias_steps: 161,
            noise: 1e-7,
            seed: 42,
        }
    }
}

/// Critical current at in-plane field `b`.
pub fn model_ic(config: &SynthConfig, b: f64) -> f64 {
    config.ic0 * (-(b / config.b0).powi(2)).exp()
}

/// Noise-free RSJ voltage at bias `i` for critical current `ic`.
pub fn rsj_voltage(i: f64, ic: f64, rn: f64) -> f64 {
    if i.abs() <= ic {
        0.0
    } else {
        i.signum() * rn * (i * i - ic * ic).sqrt()
    }
}

/// Generate every sample of the synthetic measurement, field-major.
pub fn generate_sweep(config: &SynthConfig) -> Result<Vec<SweepPoint>, AppError> {
    if config.field_steps == 0 || config.bias_steps < 2 {
        return Err(AppError::new(2, "Need at least 1 field step and 2 bias steps."));
    }
    let positive = [config.ic0, config.rn, config.b0, config.bias_max];
    if !positive.iter().all(|v| v.is_finite() && *v > 0.0) {
        return Err(AppError::new(2, "ic0, rn, b0 and bias_max must be finite and > 0."));
    }
    if !(config.field_max.is_finite() && config.field_max >= 0.0) {
        return Err(AppError::new(2, "field_max must be finite and >= 0."));
    }
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut points = Vec::with_capacity(config.field_steps * config.bias_steps);

    for fi in 0..config.field_steps {
        let b = linspace_at(-config.field_max, config.field_max, config.field_steps, fi);
        let ic = model_ic(config, b);
        for bi in 0..config.bias_steps {
            let i = linspace_at(-config.bias_max, config.bias_max, config.bias_steps, bi);
            let v = rsj_voltage(i, ic, config.rn) + normal.sample(&mut rng);
            points.push(SweepPoint {
                gate: config.gate.clone(),
                field: Tesla(b),
                bias: i,
                scaled_voltage: v,
            });
        }
    }

    Ok(points)
}

/// Write samples in the ingest CSV schema.
pub fn write_sweep_csv(path: &Path, points: &[SweepPoint]) -> Result<(), AppError> {
    const WHAT: &str = "sweep CSV";
    let mut writer = csv_writer(path, WHAT)?;

    write_row(&mut writer, WHAT, ["gate", "field", "bias", "scaled_voltage"])?;
    for p in points {
        let field = format!("{:e}", p.field.value());
        let bias = format!("{:e}", p.bias);
        let voltage = format!("{:e}", p.scaled_voltage);
        write_row(
            &mut writer,
            WHAT,
            [p.gate.as_str(), field.as_str(), bias.as_str(), voltage.as_str()],
        )?;
    }

    finish(writer, WHAT)
}

fn linspace_at(start: f64, end: f64, n: usize, k: usize) -> f64 {
    if n < 2 {
        return 0.5 * (start + end);
    }
    start + (end - start) * k as f64 / (n as f64 - 1.0)
}
