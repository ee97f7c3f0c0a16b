//! # Awful News Post
//!
//! Turns the newest issue of an AI newsletter into a single social-media
//! post, with a human deciding what gets published.
//!
//! ## Usage
//!
//! ```sh
//! awful_news_post -o linkedin_post.txt
//! ```
//!
//! ## Architecture
//!
//! One run walks a fixed set of steps over a shared state:
//! 1. **Fetching**: Download the feed and split the newest entry into articles
//! 2. **Deduplicating**: Drop repeats by title or opening text
//! 3. **Ranking**: Ask the LLM which articles matter most
//! 4. **Selecting**: The operator picks one (or the model's pick is taken)
//! 5. **Drafting / Reviewing**: Write the post, revise until the operator accepts
//! 6. **Persisting**: Save the approved post to a file
//!
//! Exit status is 0 when the post was saved, 1 when the run failed, and 2
//! when operator input closed mid-run.

use awful_aj::{config, config_dir, template};
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod console;
mod errors;
mod feeds;
mod models;
mod outputs;
mod prompts;
mod steps;
mod utils;
mod workflow;

use cli::Cli;
use console::Console;
use feeds::HttpFeed;
use models::{Stage, WorkflowState};
use outputs::file::{FileSink, PostSink};
use outputs::json;
use steps::drafter::DraftGenerator;
use steps::ranker::Ranker;
use utils::ensure_writable_parent;
use workflow::{Workflow, graph_mermaid};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    // stdout belongs to the operator dialogue; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if args.print_graph {
        println!("{}", graph_mermaid(&args.workflow_options()));
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("awful_news_post starting up");

    // Early check: fail before any LLM spend if the post can't be saved
    if let Err(e) = ensure_writable_parent(&args.output).await {
        error!(
            path = %args.output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Load config & templates ----
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml").to_string_lossy().into_owned(),
    };
    let config = config::load_config(&config_path)?;
    info!(config_path, "Loaded configuration");

    let ranker_template = template::load_template(&args.ranker_template).await?;
    let writer_template = template::load_template(&args.writer_template).await?;
    info!(
        ranker = %args.ranker_template,
        writer = %args.writer_template,
        "Loaded templates"
    );

    // ---- Wire up the workflow ----
    let feed = HttpFeed::new(args.feed_url.clone())?;
    info!(url = %feed.url(), "Using feed");
    let sink = FileSink::new(&args.output);
    let destination = sink.destination();

    let mut workflow = Workflow::new(
        feed,
        Ranker::new(
            api::client(&config, &ranker_template, args.llm_retries),
            args.rank_mode(),
        ),
        DraftGenerator::new(api::client(&config, &writer_template, args.llm_retries)),
        Console::stdio(),
        sink,
        args.workflow_options(),
    );

    let mut state = WorkflowState::new();
    let result = workflow.run_with(&mut state).await;

    if let Some(path) = &args.state_dump {
        if let Err(e) = json::write_state(&state, path).await {
            error!(path = %path.display(), error = %e, "Failed to write state dump");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        revisions = state.revisions,
        "Execution complete"
    );

    let code = match result {
        Ok(Stage::Done) => {
            println!("\nPost saved to {destination}");
            ExitCode::SUCCESS
        }
        Ok(_) => {
            eprintln!(
                "Workflow failed at {}: {}",
                state.current_step,
                state.error().unwrap_or("unknown error")
            );
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Aborted: {e}");
            ExitCode::from(2)
        }
    };
    Ok(code)
}
