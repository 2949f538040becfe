//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the extraction code stays free of presentation concerns
//! - output changes are localized

use crate::domain::{Branch, CurvesFile, ExtractConfig, FieldAxis, SweepExtraction, Thresholds};
use crate::io::ingest::IngestedData;

/// Row and slice errors listed before they are summarized as a count.
const MAX_LISTED_ERRORS: usize = 5;

/// Format the run header: input, thresholds and ingest diagnostics.
pub fn format_run_summary(config: &ExtractConfig, ingest: &IngestedData) -> String {
    let mut out = String::new();

    out.push_str("=== jj - Josephson junction transport ===\n");
    out.push_str(&format!("File: {}\n", config.data_path.display()));
    out.push_str(&format_settings(&config.sample, config.field_axis, &config.thresholds, config.branch));
    out.push_str(&format!(
        "Rows: read={} | used={} | errors={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Slices: n={} in {} sweep(s) | B=[{:.1}, {:.1}] mT | I=[{:.3}, {:.3}] µA\n",
        ingest.stats.n_slices,
        ingest.stats.n_sweeps,
        ingest.stats.field_min * 1e3,
        ingest.stats.field_max * 1e3,
        ingest.stats.bias_min * 1e6,
        ingest.stats.bias_max * 1e6,
    ));

    for e in ingest.row_errors.iter().take(MAX_LISTED_ERRORS) {
        out.push_str(&format!("  (row {}) {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > MAX_LISTED_ERRORS {
        out.push_str(&format!("  ... {} more row errors\n", ingest.row_errors.len() - MAX_LISTED_ERRORS));
    }
    for e in ingest.slice_errors.iter().take(MAX_LISTED_ERRORS) {
        out.push_str(&format!(
            "  (skipped slice gate={} B={:.1} mT) {}\n",
            e.gate,
            e.field.value() * 1e3,
            e.message
        ));
    }
    if ingest.slice_errors.len() > MAX_LISTED_ERRORS {
        out.push_str(&format!(
            "  ... {} more skipped slices\n",
            ingest.slice_errors.len() - MAX_LISTED_ERRORS
        ));
    }
    out.push('\n');

    out
}

/// Format a saved curves file for `jj show`.
pub fn format_curves_file(curves: &CurvesFile) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} curves ({}) ===\n", curves.tool, curves.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push_str(&format_settings(&curves.sample, curves.field_axis, &curves.thresholds, curves.branch));
    out.push('\n');
    for sweep in &curves.sweeps {
        out.push_str(&format_extraction(sweep));
        out.push('\n');
    }

    out
}

/// Format one gate sweep: the curve table followed by its failed slices.
pub fn format_extraction(extraction: &SweepExtraction) -> String {
    let mut out = String::new();

    out.push_str(&format!("Gate {}:\n", extraction.gate));
    out.push_str(&format!(
        "{:>10} {:>10} {:>10} {:>10}\n",
        "B∥ (mT)", "Ic (µA)", "Rn (Ω)", "IcRn (µV)"
    ));
    out.push_str(&format!("{:->10} {:->10} {:->10} {:->10}\n", "", "", "", ""));

    for field in extraction.fields() {
        out.push_str(&format!(
            "{:>10.1} {:>10} {:>10} {:>10}\n",
            field.value() * 1e3,
            cell(extraction.ic.value_at(field), 1e6, 3),
            cell(extraction.rn.value_at(field), 1.0, 1),
            cell(extraction.ic_rn.value_at(field), 1e6, 2),
        ));
    }

    if !extraction.failures.is_empty() {
        out.push_str("Failed slices:\n");
        for f in &extraction.failures {
            out.push_str(&format!(
                "  B={:.1} mT {:?}: {}\n",
                f.field.value() * 1e3,
                f.curve,
                f.error
            ));
        }
    }

    out
}

fn format_settings(sample: &str, axis: FieldAxis, thresholds: &Thresholds, branch: Branch) -> String {
    format!(
        "Sample: {sample} | field axis: {}\nThresholds: Ic |V| < {:.1} µV ({branch:?} branch) | Rn |I| >= {:.3} µA\n",
        axis.label(),
        thresholds.ic_voltage.value() * 1e6,
        thresholds.high_bias.value() * 1e6,
    )
}

fn cell(value: Option<f64>, scale: f64, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v * scale),
        None => "-".to_string(),
    }
}
