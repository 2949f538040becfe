//! `jj-transport` library crate.
//!
//! Extracts critical current, normal resistance and their product from
//! Josephson-junction bias sweeps taken versus in-plane magnetic field.
//!
//! The binary (`jj`) is a thin wrapper around this library so that:
//!
//! - the reductions are testable without spawning processes
//! - notebooks or other front-ends can call `transport` directly

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
pub mod transport;
