//! NewsEval - multi-model consensus evaluation for news articles
//!
//! A CLI client for the news evaluation backend: submits article URLs,
//! follows the evaluator models' progress stream live, and renders the
//! consensus report or the historical results.
//!
//! Exit codes:
//!   0 - Success (every submission delivered its result)
//!   1 - Runtime error (connection, config, failed or unfinished evaluation)

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod report;
mod stream;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use client::BackendClient;
use config::{Config, CONFIG_FILE_NAME};
use models::AnalysisResult;
use report::ResultView;
use std::time::Duration;
use stream::{ProgressPrinter, Session, SubmissionOutcome};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first: it may turn on verbose logging
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, config.general.verbose);

    info!("NewsEval v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    let outcome = if args.history {
        run_history(&args, &config).await
    } else {
        run_evaluations(&args, &config).await
    };

    match outcome {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .newseval.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your backend and tune the report.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Submit every URL in turn and render the collected results.
/// Returns the exit code.
async fn run_evaluations(args: &Args, config: &Config) -> Result<i32> {
    let client = BackendClient::new(&config.backend)?;

    let mut session = Session::new(Duration::from_millis(config.display.done_delay_ms));
    let ready_delay = Duration::from_millis(config.display.ready_delay_ms);

    let mut views = Vec::new();
    let mut failures = 0usize;

    for (index, url) in args.urls.iter().enumerate() {
        if index > 0 && !ready_delay.is_zero() {
            tokio::time::sleep(ready_delay).await;
        }

        if !args.quiet {
            println!("📰 Evaluating article: {}", url);
        }

        let mut printer = ProgressPrinter::new(!args.quiet);
        let generation = session.start(&mut printer);

        let outcome = match client.open_analysis_stream(url.trim()).await {
            Ok(events) => {
                session
                    .consume(generation, events, &mut printer, |payload| {
                        serde_json::from_value::<AnalysisResult>(payload)
                    })
                    .await
            }
            Err(e) => {
                warn!("Could not open the event stream: {}", e);
                session.abort(generation, &e, &mut printer)
            }
        };

        match outcome {
            SubmissionOutcome::Completed(Ok(result)) => {
                let view = ResultView::build(&result, config.display.top_answers);
                info!(
                    "{}: {} of {} fields without consensus",
                    url,
                    view.no_consensus_count(),
                    view.cards.len()
                );
                views.push(view);
            }
            SubmissionOutcome::Completed(Err(e)) => {
                error!("Final result for {} could not be decoded: {}", url, e);
                eprintln!("❌ Unreadable result for {}: {}", url, e);
                failures += 1;
            }
            SubmissionOutcome::Failed(reason) => {
                eprintln!("❌ Evaluation of {} failed: {}", url, reason);
                failures += 1;
            }
            SubmissionOutcome::Unfinished => {
                eprintln!("⚠️  The backend closed the stream for {} without a result.", url);
                failures += 1;
            }
            SubmissionOutcome::Superseded => {
                debug!("Submission for {} superseded", url);
                failures += 1;
            }
        }

        let state = session.controller().state();
        if !state.is_terminal() {
            debug!("Submission for {} left in state {:?}", url, state);
        }
    }

    if !views.is_empty() {
        let output = match config.general.format {
            OutputFormat::Json => report::generate_json_report(&views)?,
            OutputFormat::Markdown => report::generate_markdown_reports(&views),
        };
        emit(args, &output)?;
    }

    if !args.quiet {
        println!(
            "\n✅ {} of {} evaluations completed",
            views.len(),
            args.urls.len()
        );
    }

    Ok(if failures > 0 { 1 } else { 0 })
}

/// Fetch and render the historical results report.
async fn run_history(args: &Args, config: &Config) -> Result<i32> {
    let client = BackendClient::new(&config.backend)?;

    if !args.quiet {
        println!("📚 Fetching historical results...");
    }

    let groups = client.fetch_results().await?;
    let view = report::build_history_view(&groups);

    let output = match config.general.format {
        OutputFormat::Json => report::generate_history_json(&view)?,
        OutputFormat::Markdown => report::generate_history_markdown(&view),
    };
    emit(args, &output)?;

    Ok(0)
}

/// Write the report to --output, or print it.
fn emit(args: &Args, output: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("\n📝 Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        // Explicit config path must load
        Some(ref config_path) => Config::load(config_path)?,
        // Default location is optional
        None => match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
                Config::default()
            }
        },
    };

    config.merge_with_args(args);
    Ok(config)
}
