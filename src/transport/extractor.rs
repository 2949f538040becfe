//! Reductions of a single bias sweep.
//!
//! Every function here is pure: it takes the bias (A) and scaled voltage (V)
//! arrays of one field slice and returns a derived quantity or an
//! `ExtractError`. Inputs do not need to be sorted.

use crate::domain::{Amperes, Branch, Ohms, Volts};
use crate::error::ExtractError;
use crate::math::{fit_line, finite_differences};

/// Minimum number of samples any reduction accepts.
const MIN_SAMPLES: usize = 2;

/// Discrete `dV/dI` between consecutive samples.
///
/// The output has `bias.len() - 1` elements, in input order.
pub fn differential_resistance(bias: &[f64], scaled_voltage: &[f64]) -> Result<Vec<f64>, ExtractError> {
    check_samples(bias, scaled_voltage)?;
    finite_differences(bias, scaled_voltage).map_err(|index| ExtractError::DegenerateBias { index })
}

/// Critical current: the largest bias magnitude reached, walking outward
/// from zero bias, while `|V|` stays strictly below `ic_voltage_threshold`.
///
/// Each branch starts at its own sample nearest zero bias (a sample at
/// exactly zero belongs to both branches) and stops at the first sample at
/// or above the threshold. With `Branch::Both` the larger branch wins; equal
/// magnitudes on both branches give that magnitude.
pub fn critical_current(
    bias: &[f64],
    scaled_voltage: &[f64],
    ic_voltage_threshold: Volts,
    branch: Branch,
) -> Result<Amperes, ExtractError> {
    let threshold = check_threshold(ic_voltage_threshold.value())?;
    check_samples(bias, scaled_voltage)?;

    let mut order: Vec<usize> = (0..bias.len()).collect();
    order.sort_by(|&a, &b| bias[a].total_cmp(&bias[b]));

    let walk = |indices: &mut dyn Iterator<Item = usize>| -> Option<f64> {
        let mut reached = None;
        for i in indices {
            if scaled_voltage[i].abs() < threshold {
                reached = Some(bias[i].abs());
            } else {
                break;
            }
        }
        reached
    };

    let positive = || walk(&mut order.iter().copied().filter(|&i| bias[i] >= 0.0));
    let negative = || walk(&mut order.iter().rev().copied().filter(|&i| bias[i] <= 0.0));

    let ic = match branch {
        Branch::Positive => positive(),
        Branch::Negative => negative(),
        Branch::Both => match (positive(), negative()) {
            (Some(p), Some(n)) => Some(p.max(n)),
            (p, n) => p.or(n),
        },
    };

    ic.map(Amperes)
        .ok_or(ExtractError::ThresholdNotFound { threshold })
}

/// Normal resistance: slope of the least-squares line `V = a + Rn·I` through
/// the samples with `|bias| >= high_bias_threshold`.
pub fn normal_resistance(
    bias: &[f64],
    scaled_voltage: &[f64],
    high_bias_threshold: Amperes,
) -> Result<Ohms, ExtractError> {
    let threshold = check_threshold(high_bias_threshold.value())?;
    check_samples(bias, scaled_voltage)?;

    let (x, y): (Vec<f64>, Vec<f64>) = bias
        .iter()
        .zip(scaled_voltage)
        .filter(|(i, _)| i.abs() >= threshold)
        .map(|(&i, &v)| (i, v))
        .unzip();

    if x.len() < MIN_SAMPLES {
        return Err(ExtractError::InsufficientData {
            needed: MIN_SAMPLES,
            got: x.len(),
        });
    }

    match fit_line(&x, &y) {
        Some(fit) => Ok(Ohms(fit.slope)),
        None => {
            let mut distinct = x.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            Err(ExtractError::InsufficientData {
                needed: MIN_SAMPLES,
                got: distinct.len(),
            })
        }
    }
}

/// `Ic · Rn`, the characteristic voltage of the junction.
pub fn ic_rn_product(ic: Amperes, rn: Ohms) -> Volts {
    ic * rn
}

fn check_samples(bias: &[f64], scaled_voltage: &[f64]) -> Result<(), ExtractError> {
    if bias.len() != scaled_voltage.len() {
        return Err(ExtractError::LengthMismatch {
            bias: bias.len(),
            voltage: scaled_voltage.len(),
        });
    }
    if bias.len() < MIN_SAMPLES {
        return Err(ExtractError::InsufficientData {
            needed: MIN_SAMPLES,
            got: bias.len(),
        });
    }
    if let Some(index) = bias
        .iter()
        .zip(scaled_voltage)
        .position(|(i, v)| !(i.is_finite() && v.is_finite()))
    {
        return Err(ExtractError::NonFinite { index });
    }
    Ok(())
}

fn check_threshold(value: f64) -> Result<f64, ExtractError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ExtractError::InvalidThreshold { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_resistance_of_a_100_ohm_line() {
        let bias = [-20e-6, -10e-6, 0.0, 10e-6, 20e-6];
        let v = [-2e-3, -1e-3, 0.0, 1e-3, 2e-3];
        let rn = normal_resistance(&bias, &v, Amperes(10e-6)).unwrap();
        assert!((rn.value() - 100.0).abs() < 1e-9, "Rn = {rn}");
    }

    #[test]
    fn normal_resistance_ignores_the_superconducting_plateau() {
        // Zero voltage below 8 µA, 50 Ω with an excess-current offset above.
        let bias: Vec<f64> = (-20..=20).map(|k| k as f64 * 1e-6).collect();
        let v: Vec<f64> = bias
            .iter()
            .map(|&i: &f64| if i.abs() < 8e-6 { 0.0 } else { 50.0 * (i - i.signum() * 1e-6) })
            .collect();

        let rn = normal_resistance(&bias, &v, Amperes(10e-6)).unwrap();
        // One line through both offset branches comes out flatter than 50 Ω.
        assert!(rn.value() > 40.0 && rn.value() < 50.0, "Rn = {rn}");

        let (pb, pv): (Vec<f64>, Vec<f64>) = bias
            .iter()
            .copied()
            .zip(v.iter().copied())
            .filter(|(i, _)| *i > 0.0)
            .unzip();
        let rn = normal_resistance(&pb, &pv, Amperes(10e-6)).unwrap();
        assert!((rn.value() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn normal_resistance_needs_two_high_bias_samples() {
        let bias = [0.0, 1e-6, 20e-6];
        let v = [0.0, 0.0, 2e-3];
        assert_eq!(
            normal_resistance(&bias, &v, Amperes(10e-6)),
            Err(ExtractError::InsufficientData { needed: 2, got: 1 })
        );
    }

    #[test]
    fn normal_resistance_with_a_single_distinct_bias() {
        let bias = [20e-6, 20e-6, 0.0];
        let v = [2e-3, 2.1e-3, 0.0];
        assert_eq!(
            normal_resistance(&bias, &v, Amperes(10e-6)),
            Err(ExtractError::InsufficientData { needed: 2, got: 1 })
        );
    }

    #[test]
    fn critical_current_example() {
        let bias = [0.0, 5e-6, 10e-6];
        let v = [0.0, 5e-8, 2e-4];
        let ic = critical_current(&bias, &v, Volts(1e-4), Branch::Both).unwrap();
        assert_eq!(ic, Amperes(5e-6));
    }

    #[test]
    fn critical_current_per_branch() {
        // Asymmetric switching: +3 µA and -2 µA.
        let bias = [-4e-6, -3e-6, -2e-6, -1e-6, 0.0, 1e-6, 2e-6, 3e-6, 4e-6];
        let v = [-4e-4, -3e-4, -1e-7, 0.0, 0.0, 0.0, 1e-7, 2e-7, 4e-4];
        let thr = Volts(1e-5);

        assert_eq!(critical_current(&bias, &v, thr, Branch::Positive).unwrap(), Amperes(3e-6));
        assert_eq!(critical_current(&bias, &v, thr, Branch::Negative).unwrap(), Amperes(2e-6));
        assert_eq!(critical_current(&bias, &v, thr, Branch::Both).unwrap(), Amperes(3e-6));
    }

    #[test]
    fn critical_current_accepts_descending_sweeps() {
        let bias = [10e-6, 5e-6, 0.0];
        let v = [2e-4, 5e-8, 0.0];
        assert_eq!(
            critical_current(&bias, &v, Volts(1e-4), Branch::Both).unwrap(),
            Amperes(5e-6)
        );
    }

    #[test]
    fn critical_current_stops_at_first_resistive_sample() {
        // A retrapped zero-voltage sample beyond the switching point does not count.
        let bias = [0.0, 1e-6, 2e-6, 3e-6];
        let v = [0.0, 0.0, 5e-4, 0.0];
        assert_eq!(
            critical_current(&bias, &v, Volts(1e-4), Branch::Positive).unwrap(),
            Amperes(1e-6)
        );
    }

    #[test]
    fn critical_current_without_zero_bias_sample() {
        // Branches start at their own nearest sample.
        let bias = [-3e-6, -1e-6, 1e-6, 3e-6];
        let v = [-1e-3, 0.0, 0.0, 1e-3];
        assert_eq!(
            critical_current(&bias, &v, Volts(1e-4), Branch::Both).unwrap(),
            Amperes(1e-6)
        );
    }

    #[test]
    fn critical_current_threshold_not_found() {
        let bias = [0.0, 1e-6];
        let v = [2e-4, 3e-4];
        assert_eq!(
            critical_current(&bias, &v, Volts(1e-4), Branch::Both),
            Err(ExtractError::ThresholdNotFound { threshold: 1e-4 })
        );
    }

    #[test]
    fn critical_current_branch_without_samples() {
        let bias = [0.5e-6, 1e-6, 2e-6];
        let v = [0.0, 0.0, 1e-3];
        assert_eq!(
            critical_current(&bias, &v, Volts(1e-4), Branch::Negative),
            Err(ExtractError::ThresholdNotFound { threshold: 1e-4 })
        );
    }

    #[test]
    fn differential_resistance_of_a_linear_sweep() {
        let bias = [0.0, 1e-6, 2e-6, 3e-6];
        let v = [0.0, 1e-4, 2e-4, 3e-4];
        let dr = differential_resistance(&bias, &v).unwrap();
        assert_eq!(dr.len(), 3);
        assert!(dr.iter().all(|r| (r - 100.0).abs() < 1e-9));
    }

    #[test]
    fn differential_resistance_rejects_repeated_bias() {
        let bias = [0.0, 1e-6, 1e-6];
        let v = [0.0, 1e-4, 2e-4];
        assert_eq!(
            differential_resistance(&bias, &v),
            Err(ExtractError::DegenerateBias { index: 1 })
        );
    }

    #[test]
    fn short_inputs_are_insufficient() {
        let err = ExtractError::InsufficientData { needed: 2, got: 0 };
        assert_eq!(differential_resistance(&[], &[]), Err(err.clone()));
        assert_eq!(critical_current(&[], &[], Volts(1e-4), Branch::Both), Err(err.clone()));
        assert_eq!(normal_resistance(&[], &[], Amperes(1e-6)), Err(err));

        let err = ExtractError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(differential_resistance(&[1e-6], &[0.0]), Err(err.clone()));
        assert_eq!(critical_current(&[0.0], &[0.0], Volts(1e-4), Branch::Both), Err(err.clone()));
        assert_eq!(normal_resistance(&[20e-6], &[1e-3], Amperes(1e-6)), Err(err));
    }

    #[test]
    fn mismatched_and_non_finite_inputs() {
        assert_eq!(
            differential_resistance(&[0.0, 1.0], &[0.0]),
            Err(ExtractError::LengthMismatch { bias: 2, voltage: 1 })
        );
        assert_eq!(
            critical_current(&[0.0, f64::NAN], &[0.0, 0.0], Volts(1e-4), Branch::Both),
            Err(ExtractError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        assert_eq!(
            critical_current(&[0.0, 1.0], &[0.0, 0.0], Volts(-1.0), Branch::Both),
            Err(ExtractError::InvalidThreshold { value: -1.0 })
        );
        assert!(matches!(
            normal_resistance(&[0.0, 1.0], &[0.0, 0.0], Amperes(f64::NAN)),
            Err(ExtractError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn ic_rn_is_the_product() {
        let v = ic_rn_product(Amperes(2e-6), Ohms(100.0));
        assert!((v.value() - 2e-4).abs() < 1e-18);
    }
}
