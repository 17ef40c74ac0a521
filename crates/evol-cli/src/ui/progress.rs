//! Progress indicators for pipeline runs.
//!
//! Spinners come from `indicatif` and are only drawn on an interactive
//! stdout. [`PhaseTracker`] turns the pipeline's progress events into a
//! step tree:
//!
//! ```text
//! ├─ Seed generation done (3 seeds, 1.2s)
//! ├─ Simple evolution done (3 questions, 2.0s)
//! ├─ ⠋ Multi context evolution: Generated multi_context_1...
//! ```

use std::time::{Duration, Instant};

use evol_core::{ProgressEvent, ProgressEventKind};
use indicatif::{ProgressBar, ProgressStyle};

use super::format::{format_duration, single_line, truncate_str};

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: animated spinners and a step tree
    Interactive,
    /// Non-TTY or `--quiet`: final results only
    Quiet,
    /// Machine-readable output (`--json`, `--stream`): nothing
    Silent,
}

impl ProgressMode {
    /// Detect the appropriate mode from flags and stdout.
    pub fn detect(quiet: bool, machine_output: bool) -> Self {
        if machine_output {
            Self::Silent
        } else if quiet || !atty::is(atty::Stream::Stdout) {
            Self::Quiet
        } else {
            Self::Interactive
        }
    }

    /// Check if progress should be drawn.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

const STEP_MESSAGE_CHARS: usize = 60;

fn spinner(template: &str, message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(SPINNER_CHARS)
        .template(template)
    {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// A single spinner, hidden outside interactive mode.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Create a spinner for an indeterminate operation.
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            spinner("{spinner:.cyan} {msg} ({elapsed})", message.to_string())
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Finish and clear the progress line.
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Human label for a phase wire name: `simple_evolution` -> `Simple evolution`.
pub fn phase_label(phase: &str) -> String {
    let spaced = phase.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What a [`PhaseTracker`] saw during a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Warning messages, in order.
    pub warnings: Vec<String>,
    /// Item-level failures (skipped questions, placeholder answers).
    pub item_errors: usize,
}

struct ActiveStep {
    label: String,
    bar: Option<ProgressBar>,
    started: Instant,
}

/// Renders progress events as a step tree.
pub struct PhaseTracker {
    mode: ProgressMode,
    active: Option<ActiveStep>,
    summary: RunSummary,
}

impl PhaseTracker {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            active: None,
            summary: RunSummary::default(),
        }
    }

    /// Feed one event.
    pub fn handle(&mut self, event: &ProgressEvent) {
        match event.kind {
            ProgressEventKind::PhaseStart => self.begin(&event.phase),
            ProgressEventKind::Step => {
                if let Some(ActiveStep { label, bar: Some(bar), .. }) = &self.active {
                    let text = truncate_str(&single_line(&event.message), STEP_MESSAGE_CHARS);
                    bar.set_message(format!("{}: {}", label, text));
                }
            }
            ProgressEventKind::Warning => self.summary.warnings.push(event.message.clone()),
            ProgressEventKind::Error => {
                let fatal = event
                    .detail("fatal")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if fatal {
                    self.end("failed");
                } else {
                    self.summary.item_errors += 1;
                }
            }
            ProgressEventKind::PhaseComplete => self.end("done"),
            ProgressEventKind::Start | ProgressEventKind::Success | ProgressEventKind::Complete => {}
        }
    }

    fn begin(&mut self, phase: &str) {
        self.end("done");
        let label = phase_label(phase);
        let bar = self
            .mode
            .is_interactive()
            .then(|| spinner("├─ {spinner:.cyan} {msg}", format!("{}...", label)));
        self.active = Some(ActiveStep {
            label,
            bar,
            started: Instant::now(),
        });
    }

    fn end(&mut self, outcome: &str) {
        let Some(step) = self.active.take() else {
            return;
        };
        if let Some(bar) = step.bar {
            bar.finish_and_clear();
        }
        if self.mode.is_interactive() {
            println!(
                "├─ {} {} ({})",
                step.label,
                outcome,
                format_duration(step.started.elapsed())
            );
        }
    }

    /// Close any open step and return what was seen.
    pub fn finish(mut self) -> RunSummary {
        self.end("done");
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evol_core::Phase;
    use serde_json::json;

    fn event(kind: ProgressEventKind, phase: Phase) -> ProgressEvent {
        ProgressEvent::now(kind, phase, "message")
    }

    #[test]
    fn test_progress_mode_detection() {
        assert_eq!(ProgressMode::detect(false, true), ProgressMode::Silent);
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Quiet);
        assert!(!ProgressMode::Silent.is_interactive());
    }

    #[test]
    fn test_phase_label() {
        assert_eq!(phase_label("multi_context_evolution"), "Multi context evolution");
        assert_eq!(phase_label("seed_generation"), "Seed generation");
        assert_eq!(phase_label(""), "");
    }

    #[test]
    fn test_hidden_spinner() {
        let progress = Progress::spinner("Generating...", ProgressMode::Quiet);
        progress.finish_clear();
    }

    #[test]
    fn test_tracker_counts_events() {
        let mut tracker = PhaseTracker::new(ProgressMode::Quiet);
        tracker.handle(&event(ProgressEventKind::Start, Phase::Initialized));
        tracker.handle(&event(ProgressEventKind::Warning, Phase::Initialized));
        tracker.handle(&event(ProgressEventKind::PhaseStart, Phase::SeedGeneration));
        tracker.handle(&event(ProgressEventKind::Step, Phase::SeedGeneration));
        tracker.handle(&event(ProgressEventKind::Error, Phase::SeedGeneration));
        tracker.handle(&event(ProgressEventKind::PhaseComplete, Phase::SeedGeneration));

        let summary = tracker.finish();
        assert_eq!(summary.warnings, vec!["message".to_string()]);
        assert_eq!(summary.item_errors, 1);
    }

    #[test]
    fn test_tracker_fatal_error_is_not_an_item_error() {
        let mut tracker = PhaseTracker::new(ProgressMode::Quiet);
        tracker.handle(&event(ProgressEventKind::PhaseStart, Phase::SimpleEvolution));
        tracker.handle(
            &ProgressEvent::now(ProgressEventKind::Error, Phase::SimpleEvolution, "Phase failed")
                .with_details(json!({ "fatal": true })),
        );

        let summary = tracker.finish();
        assert_eq!(summary.item_errors, 0);
        assert!(summary.warnings.is_empty());
    }
}
