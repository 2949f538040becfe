//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the run configuration
//! - runs the extraction pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExtractArgs, ShowArgs, SimulateArgs};
use crate::data::{SynthConfig, generate_sweep, write_sweep_csv};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `jj` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Extract(args) => handle_extract(&args),
        Command::Show(args) => handle_show(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

/// Logs go to stderr, filtered by `log_filter`.
fn init_tracing(verbose: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` when set and valid, else `warn`; `-v` raises this crate to
/// `info`, `-vv` to `debug`.
pub fn log_filter(rust_log: Option<&str>, verbose: u8) -> EnvFilter {
    let mut filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let crate_level = match verbose {
        0 => None,
        1 => Some("jj_transport=info"),
        _ => Some("jj_transport=debug"),
    };
    if let Some(Ok(directive)) = crate_level.map(str::parse) {
        filter = filter.add_directive(directive);
    }
    filter
}

fn handle_extract(args: &ExtractArgs) -> Result<(), AppError> {
    let config = crate::config::resolve_extract_config(args)?;
    info!(data = %config.data_path.display(), sample = %config.sample, "starting extraction");

    let run = pipeline::run_extraction(&config)?;

    if !config.quiet {
        println!("{}", crate::report::format_run_summary(&config, &run.ingest));
        for extraction in &run.extractions {
            println!("{}", crate::report::format_extraction(extraction));
        }
    }

    if let Some(out_dir) = &config.out_dir {
        let written = pipeline::write_outputs(out_dir, &config, &run.extractions)?;
        if !config.quiet {
            for path in written {
                println!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<(), AppError> {
    let curves = crate::io::curve::read_curves_json(&args.curves)?;
    println!("{}", crate::report::format_curves_file(&curves));
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(args);
    let points = generate_sweep(&config)?;
    write_sweep_csv(&args.out, &points)?;
    info!(path = %args.out.display(), rows = points.len(), "wrote synthetic sweep");
    Ok(())
}

pub fn synth_config_from_args(args: &SimulateArgs) -> SynthConfig {
    SynthConfig {
        gate: args.gate.clone(),
        ic0: args.ic0,
        rn: args.rn,
        b0: args.b0,
        field_max: args.field_max,
        field_steps: args.field_steps,
        bias_max: args.bias_max,
        bias_steps: args.bias_steps,
        noise: args.noise,
        seed: args.seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_level_is_kept() {
        assert_eq!(log_filter(Some("debug"), 0).to_string(), "debug");
        assert_eq!(log_filter(None, 0).to_string(), "warn");
    }

    #[test]
    fn verbose_adds_a_crate_directive() {
        let filter = log_filter(Some("info"), 2).to_string();
        assert!(filter.contains("jj_transport=debug"), "{filter}");
        assert!(filter.contains("info"), "{filter}");
    }

    #[test]
    fn simulate_defaults_match_synth_defaults() {
        let cli = Cli::parse_from(["jj", "simulate", "--out", "s.csv"]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let from_args = synth_config_from_args(&args);
        let defaults = SynthConfig::default();

        assert_eq!(from_args.gate, defaults.gate);
        assert_eq!(from_args.ic0, defaults.ic0);
        assert_eq!(from_args.rn, defaults.rn);
        assert_eq!(from_args.b0, defaults.b0);
        assert_eq!(from_args.field_steps, defaults.field_steps);
        assert_eq!(from_args.bias_steps, defaults.bias_steps);
        assert_eq!(from_args.noise, defaults.noise);
        assert_eq!(from_args.seed, defaults.seed);
    }
}
