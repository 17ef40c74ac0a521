//! CLI definition and command dispatch for Evol.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to `evol-core`.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (`--config`, `--provider`, `--model`, `--endpoint`, `--verbose`)
//! 2. Environment variables (`EVOL_CONFIG`, `EVOL_PROVIDER`, `EVOL_MODEL`, ...)
//! 3. Config file (`~/.evol/config.yaml` or path from `--config`/`EVOL_CONFIG`)
//! 4. Built-in defaults

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::ui::color::terminal_width;
use crate::ui::format::{format_seconds, plural};
use crate::ui::table::{render_breakdown_table, render_questions_table, render_types_table, QuestionRow};
use crate::ui::{ColorMode, MessageType, PhaseTracker, Progress, ProgressMode, RunSummary, Style};

use evol_core::state::expected_questions;
use evol_core::{
    demo_request, example_request_json, generate, progress_channel, run_streaming, write_ndjson,
    EvolConfig, EvolError, EvolPipeline, EvolutionType, GenerateRequest, GenerateResponse,
    GenerationProviderKind, IntoEvolResult, ModelGenerationPort, StreamFrame, ValidatedRequest,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Evol – evolve seed questions from documents into a synthetic QA set
#[derive(Parser, Debug)]
#[command(name = "evol")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "EVOL_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, global = true, env = "EVOL_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.evol/config.yaml)
    #[arg(long, global = true, env = "EVOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: auto)
    #[arg(
        long,
        global = true,
        env = "EVOL_COLOR",
        default_value = "auto",
        value_parser = ["always", "never", "auto"]
    )]
    pub color: String,

    /// Generation provider: openai or ollama
    #[arg(long, global = true, env = "EVOL_PROVIDER")]
    pub provider: Option<String>,

    /// Model identifier sent to the provider
    #[arg(long, global = true, env = "EVOL_MODEL")]
    pub model: Option<String>,

    /// Base URL of the generation backend
    #[arg(long, global = true, env = "EVOL_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output flags shared by `generate` and `demo`.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print the full response as JSON
    #[arg(long, conflicts_with = "stream")]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Print progress events and the result as newline-delimited JSON
    #[arg(long)]
    pub stream: bool,

    /// Also write the response JSON to this file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    fn machine_output(&self) -> bool {
        self.json || self.stream
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate evolved questions, answers and contexts from documents
    #[command(after_help = r#"EXAMPLES:
    # Generate from a request file
    evol generate request.json

    # Read the request from stdin and ask for 12 questions
    cat request.json | evol generate - --target 12

    # Stream progress as NDJSON
    evol generate request.json --stream

    # Use a local Ollama model and save the result
    evol --provider ollama --model llama3.2 generate request.json -o result.json

REQUEST FORMAT:
    {"documents": [{"content": "...", "metadata": {"source": "a.pdf"}}],
     "target_questions": 9}
"#)]
    Generate {
        /// Request JSON file, or '-' for stdin
        #[arg(value_name = "FILE|-")]
        input: String,

        /// Target number of questions (clamped to 3-15)
        #[arg(short, long)]
        target: Option<i64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the pipeline on built-in sample documents (target 9)
    #[command(after_help = r#"EXAMPLES:
    # Try the pipeline against a local Ollama
    evol --provider ollama demo

    # Inspect the full response
    evol demo --json --pretty
"#)]
    Demo {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print an example request body to start from
    #[command(after_help = r#"EXAMPLES:
    # Write a request template, edit it, then generate
    evol sample-request --pretty > request.json
    evol generate request.json
"#)]
    SampleRequest {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// List the evolution types
    Types {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the effective generation backend and configuration
    #[command(after_help = r#"EXAMPLES:
    # Show the resolved backend
    evol status

    # Check which endpoint an override resolves to
    EVOL_PROVIDER=ollama evol status --json
"#)]
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Settings
// ============================================================================

/// Configuration after file, environment and flag overrides.
struct Settings {
    config: EvolConfig,
    config_path: Option<PathBuf>,
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self, EvolError> {
        let config_path = cli.config.clone().or_else(EvolConfig::default_path);
        let mut config = match &config_path {
            Some(path) => EvolConfig::from_path(path)?,
            None => EvolConfig::default(),
        };

        if let Some(provider) = &cli.provider {
            let provider: GenerationProviderKind =
                provider
                    .parse()
                    .map_err(|message| EvolError::InvalidConfiguration {
                        message,
                        hint: "Pass --provider openai or --provider ollama".to_string(),
                    })?;
            if provider != config.generation.provider {
                // Model and endpoint defaults belong to the file's provider.
                config.generation.model = None;
                config.generation.endpoint = None;
            }
            config.generation.provider = provider;
        }
        if let Some(model) = &cli.model {
            config.generation.model = Some(model.clone());
        }
        if let Some(endpoint) = &cli.endpoint {
            config.generation.endpoint = Some(endpoint.clone());
        }

        config.generation.validate().into_evol_result()?;

        tracing::debug!(
            provider = %config.generation.provider,
            model = config.generation.effective_model(),
            endpoint = config.generation.effective_endpoint(),
            "Resolved generation settings"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    fn config_found(&self) -> bool {
        self.config_path.as_deref().is_some_and(Path::exists)
    }
}

// ============================================================================
// Run function
// ============================================================================

/// Run the CLI application.
///
/// Parses command-line arguments, resolves configuration, and dispatches
/// to the appropriate command handler.
///
/// # Returns
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so --json and --stream keep stdout clean.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!(
        "evol_core={lvl},evol_model={lvl},evol_cli={lvl}",
        lvl = log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let color_mode = ColorMode::from_flag(&cli.color).unwrap_or_default();
    let style = Style::new(color_mode);

    // Listing types and printing templates need no backend.
    match &cli.command {
        Command::Types { json } => return finish(&style, handle_types(&style, *json)),
        Command::SampleRequest { pretty } => return finish(&style, handle_sample_request(*pretty)),
        _ => {}
    }

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your global config at ~/.evol/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to load configuration",
                    Some(&e.to_string()),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Generate {
            input,
            target,
            output,
        } => handle_generate(&style, &settings, &input, target, &output, cli.quiet),
        Command::Demo { output } => run_request(&style, &settings, demo_request(), &output, cli.quiet),
        Command::Status { json } => handle_status(&style, &settings, json),
        Command::Types { json } => handle_types(&style, json),
        Command::SampleRequest { pretty } => handle_sample_request(pretty),
    };

    finish(&style, result)
}

fn finish(style: &Style, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style.message(MessageType::Err, &format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_generate(
    style: &Style,
    settings: &Settings,
    input: &str,
    target: Option<i64>,
    output: &OutputArgs,
    quiet: bool,
) -> Result<()> {
    let text = read_input(input)?;
    let mut request = GenerateRequest::from_json(&text)?;
    if target.is_some() {
        request.target_questions = target;
    }
    run_request(style, settings, request, output, quiet)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read request from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
}

fn run_request(
    style: &Style,
    settings: &Settings,
    request: GenerateRequest,
    output: &OutputArgs,
    quiet: bool,
) -> Result<()> {
    let request = request.validate_with_default(settings.config.pipeline.default_target_questions)?;
    let port = ModelGenerationPort::from_config(&settings.config.generation)?;
    let pipeline = EvolPipeline::new(Arc::new(port), settings.config.pipeline.clone());
    let runtime = runtime()?;

    if output.stream {
        return stream_request(&runtime, pipeline, request, output);
    }

    let mode = ProgressMode::detect(quiet, output.machine_output());
    if !output.json && !quiet {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!(
                    "Generating {} from {} with {}",
                    plural(request.target_questions, "question"),
                    plural(request.documents.len(), "document"),
                    pipeline.describe()
                )
            )
        );
    }

    let (result, summary) = runtime.block_on(run_with_tracker(pipeline, request, mode));

    if !output.json {
        for warning in &summary.warnings {
            eprintln!("{}", style.message(MessageType::Warn, warning));
        }
    }

    let response = result?;

    if output.json {
        println!("{}", to_json(&response, output.pretty)?);
    } else {
        print_response(style, &response, &summary, quiet);
    }

    if let Some(path) = &output.output {
        write_response(path, &response, output.pretty)?;
        if !output.json && !quiet {
            println!(
                "{}",
                style.message(MessageType::Ok, &format!("Wrote response to {}", path.display()))
            );
        }
    }

    Ok(())
}

/// Run the pipeline while feeding its progress events to a step tree.
async fn run_with_tracker(
    pipeline: EvolPipeline,
    request: ValidatedRequest,
    mode: ProgressMode,
) -> (Result<GenerateResponse, EvolError>, RunSummary) {
    let (sink, mut receiver) = progress_channel();
    let task = tokio::spawn(async move { generate(&pipeline, request, Some(Arc::new(sink))).await });

    let spinner = Progress::spinner("Starting pipeline...", mode);
    let mut tracker = PhaseTracker::new(mode);
    let mut started = false;
    while let Some(event) = receiver.recv().await {
        if !started {
            spinner.finish_clear();
            started = true;
        }
        tracker.handle(&event);
    }
    spinner.finish_clear();

    let result = match task.await {
        Ok(result) => result,
        Err(join) => Err(EvolError::Stream(format!("Pipeline task failed: {}", join))),
    };
    (result, tracker.finish())
}

fn stream_request(
    runtime: &tokio::runtime::Runtime,
    pipeline: EvolPipeline,
    request: ValidatedRequest,
    output: &OutputArgs,
) -> Result<()> {
    let terminal = runtime.block_on(async move {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_ndjson(run_streaming(pipeline, request), &mut handle).await
    })?;

    if let StreamFrame::Error { message } = terminal {
        return Err(anyhow!(message));
    }
    if let (StreamFrame::Completed { response }, Some(path)) = (&terminal, &output.output) {
        write_response(path, response, output.pretty)?;
    }
    Ok(())
}

fn to_json(response: &GenerateResponse, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    Ok(text)
}

fn write_response(path: &Path, response: &GenerateResponse, pretty: bool) -> Result<()> {
    let mut text = to_json(response, pretty)?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_response(style: &Style, response: &GenerateResponse, summary: &RunSummary, quiet: bool) {
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Generated {} in {}",
                plural(response.total_questions, "question"),
                format_seconds(response.processing_time)
            )
        )
    );
    if quiet {
        return;
    }

    println!(
        "{}",
        style.message_detail("Seeds", &response.seed_questions.len().to_string())
    );
    println!(
        "{}",
        style.message_detail("Target", &response.target_questions.to_string())
    );
    let placeholders = response.placeholder_answers();
    if placeholders > 0 || summary.item_errors > 0 {
        println!(
            "{}",
            style.message_detail(
                "Placeholder answers",
                &format!("{} (marked *)", placeholders)
            )
        );
        println!(
            "{}",
            style.message_detail("Failed generations", &summary.item_errors.to_string())
        );
    }

    println!();
    println!("{}", style.section("QUESTIONS"));
    println!(
        "{}",
        render_questions_table(&QuestionRow::from_response(response), terminal_width())
    );
    println!();
    println!("{}", render_breakdown_table(response));

    // Document shortfalls are reported as warnings; this hint is about the target alone.
    if expected_questions(response.target_questions, usize::MAX) < response.target_questions {
        println!();
        println!(
            "{}",
            style.message(
                MessageType::Hint,
                "Targets that are multiples of 3 (up to 9) use the full quota of every phase"
            )
        );
    }
}

fn handle_status(style: &Style, settings: &Settings, json: bool) -> Result<()> {
    let generation = &settings.config.generation;
    let api_key_present = generation.resolve_api_key().is_some();
    let config_path = settings
        .config_path
        .as_ref()
        .map(|p| p.display().to_string());

    if json {
        let status = json!({
            "provider": generation.provider,
            "model": generation.effective_model(),
            "endpoint": generation.effective_endpoint(),
            "api_key_env": generation.api_key_env,
            "api_key_present": api_key_present,
            "config_path": config_path,
            "config_found": settings.config_found(),
            "default_target_questions": settings.config.pipeline.default_target_questions,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", style.section("GENERATION"));
    println!("{}", style.key_value("Provider", &generation.provider.to_string()));
    println!("{}", style.key_value("Model", generation.effective_model()));
    println!("{}", style.key_value("Endpoint", generation.effective_endpoint()));
    println!(
        "{}",
        style.key_value(
            "API key",
            &format!("{} ({})", style.yes_no(api_key_present), generation.api_key_env)
        )
    );
    println!();
    println!("{}", style.section("CONFIG"));
    let config_line = match &config_path {
        Some(path) if settings.config_found() => path.clone(),
        Some(path) => format!("{} {}", path, style.dim("(not found, using defaults)")),
        None => style.dim("(no home directory, using defaults)"),
    };
    println!("{}", style.key_value("File", &config_line));
    println!(
        "{}",
        style.key_value(
            "Default target",
            &settings.config.pipeline.default_target_questions.to_string()
        )
    );

    if generation.provider == GenerationProviderKind::OpenAi && !api_key_present {
        println!();
        println!(
            "{}",
            style.message(
                MessageType::Hint,
                &format!(
                    "Set {} or use --provider ollama for a local model",
                    generation.api_key_env
                )
            )
        );
    }

    Ok(())
}

fn handle_types(style: &Style, json: bool) -> Result<()> {
    let infos: Vec<_> = EvolutionType::ALL.iter().map(|t| t.info()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("{}", style.section("EVOLUTION TYPES"));
    println!("{}", render_types_table(&infos, terminal_width()));
    Ok(())
}

fn handle_sample_request(pretty: bool) -> Result<()> {
    let sample = example_request_json();
    let text = if pretty {
        serde_json::to_string_pretty(&sample)?
    } else {
        serde_json::to_string(&sample)?
    };
    println!("{}", text);
    Ok(())
}
