//! # CLI UI Module
//!
//! Styling and formatting layer for `evol` output.
//!
//! Human-readable output goes to stdout, diagnostics (`[err]`, `[warn]`)
//! to stderr. With `--json` or `--stream`, stdout carries only the
//! machine-readable payload.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Small text and duration formatters
//! - `table`: Table rendering with comfy-table
//! - `progress`: Spinners and the phase step tree

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use progress::{PhaseTracker, Progress, ProgressMode, RunSummary};
pub use style::{MessageType, Style};
