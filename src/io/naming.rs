//! Output file naming.
//!
//! Every exported file starts with a stem that embeds the sample name, the
//! in-plane field axis and (for per-gate files) the gate-voltage label, e.g.
//! `JS512-cd3_By-inplane_Vg-1.5V_icrn.csv`.

use std::path::{Path, PathBuf};

use crate::domain::FieldAxis;

/// Build the file stem for a sample / axis / optional gate.
pub fn output_stem(sample: &str, field_axis: FieldAxis, gate: Option<&str>) -> String {
    let mut stem = format!("{}_B{}-inplane", sanitize(sample), field_axis.label());
    if let Some(gate) = gate {
        stem.push_str("_Vg");
        stem.push_str(&sanitize(gate));
    }
    stem
}

/// `dir/{stem}_{suffix}`.
pub fn output_path(dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{stem}_{suffix}"))
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '=' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() { "unnamed".to_string() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_embeds_axis_and_gate() {
        assert_eq!(output_stem("JS512", FieldAxis::Y, None), "JS512_By-inplane");
        assert_eq!(
            output_stem("JS512 cd3", FieldAxis::X, Some("-1.5 V")),
            "JS512_cd3_Bx-inplane_Vg-1.5_V"
        );
    }

    #[test]
    fn path_separators_are_neutralized() {
        assert_eq!(output_stem("a/b", FieldAxis::Z, Some("")), "a_b_Bz-inplane_Vgunnamed");
        let p = output_path(Path::new("out"), "s_By-inplane", "curves.json");
        assert_eq!(p, Path::new("out").join("s_By-inplane_curves.json"));
    }
}
