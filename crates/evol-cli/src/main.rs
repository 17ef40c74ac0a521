//! # evol CLI
//!
//! Command-line interface for the Evol question-evolution pipeline.
//!
//! This binary provides human-friendly access to `evol-core` functionality.
//! Run `evol --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
