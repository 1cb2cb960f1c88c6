//! # docsift — ask a folder of documents a question.
//!
//! Runs the staged pipeline (chunk → scan → select → extract → synthesize)
//! against an OpenAI-compatible backend and prints a cited answer.
//!
//! Usage:
//!   docsift -q "When is the deadline?" -d ./docs/
//!   docsift -q "Summarize the key risks" -d ./project/ -v

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docsift_core::DocsiftConfig;
use docsift_pipeline::{PipelineController, PipelineState, RunState};

#[derive(Parser)]
#[command(
    name = "docsift",
    version,
    about = "📚 docsift — answer a question over a folder of documents, no vector index"
)]
struct Cli {
    /// Question to ask the documents
    #[arg(short, long)]
    question: String,

    /// Directory containing the documents
    #[arg(short, long)]
    directory: String,

    /// Config file path (default: ~/.docsift/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Verbose output: per-stage progress, timing, and statistics
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "docsift=debug,docsift_core=debug,docsift_chunk=debug,docsift_providers=debug,docsift_pipeline=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let directory = PathBuf::from(expand_path(&cli.directory));
    if !directory.is_dir() {
        anyhow::bail!("directory '{}' not found", directory.display());
    }

    let config = match &cli.config {
        Some(path) => DocsiftConfig::load_from(Path::new(&expand_path(path)))?,
        None => DocsiftConfig::load()?,
    };
    config.validate()?;

    if cli.verbose {
        print_banner();
        print_config(&config, &cli.question, &directory);
    }

    let client = docsift_providers::create_client(&config)?;
    let controller = PipelineController::new(config, client);

    // Ctrl-C requests cooperative cancellation; the current stage is allowed
    // to finish before the run ends.
    let cancel = controller.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested — finishing the current stage");
            cancel.request();
        }
    });

    let started = Instant::now();
    let run = controller.run(&cli.question, &directory).await;
    let total = started.elapsed();

    if run.state == PipelineState::Done {
        if cli.verbose {
            print_timings(&run, total);
            print_statistics(&run);
        }
        print_answer(&run);
        Ok(())
    } else {
        print_failure(&run);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!();
    println!("══════════════════════════════════════════════════════");
    println!("  📚 docsift — staged document analysis");
    println!("  started {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("══════════════════════════════════════════════════════");
}

fn print_config(config: &DocsiftConfig, question: &str, directory: &Path) {
    println!();
    println!("Configuration:");
    println!("  🐇 fast tier (scan)    : {}", config.models.fast);
    println!("  ⚖️  mid tier (select)   : {}", config.models.mid);
    println!("  🧠 high tier (deep)    : {}", config.models.high);
    println!(
        "  📐 chunking            : target {} / overlap {} / min {}",
        config.chunking.target_size, config.chunking.overlap, config.chunking.min_size
    );
    println!("  🌡️  temperature         : {}", config.models.temperature);
    println!();
    println!("Query:");
    println!("  📂 directory : {}", directory.display());
    println!("  ❓ question  : {question}");
}

fn print_timings(run: &RunState, total: Duration) {
    println!();
    println!("Stage timing:");
    for (stage, elapsed) in run.timings.iter() {
        let secs = elapsed.as_secs_f64();
        let pct = if total.as_secs_f64() > 0.0 {
            100.0 * secs / total.as_secs_f64()
        } else {
            0.0
        };
        let filled = (pct / 5.0).round() as usize;
        let bar: String =
            "█".repeat(filled.min(20)) + &"░".repeat(20usize.saturating_sub(filled));
        let name = stage.to_string();
        println!("  {name:<10} {bar} {secs:6.2}s ({pct:5.1}%)");
    }
    println!("  {:<10} {:20} {:6.2}s", "total", "", total.as_secs_f64());
}

fn print_statistics(run: &RunState) {
    println!();
    println!("Statistics:");
    if let Some(stats) = &run.load_stats {
        println!("  files loaded     : {}", stats.files_loaded);
        println!("  files skipped    : {}", stats.files_skipped);
        for detail in &stats.details {
            match &detail.error {
                Some(reason) => println!("    ❌ {} ({reason})", detail.name),
                None => {
                    let chunks = run.chunks.iter().filter(|c| c.document_id == detail.name).count();
                    println!("    📄 {} ({} chars → {} chunk(s))", detail.name, detail.chars, chunks)
                }
            }
        }
    }
    println!("  chunks created   : {}", run.chunks.len());
    println!("  chunks scanned   : {}", run.summaries.len());
    println!("  chunks selected  : {}", run.selection.len());
    if run.selection_fallback_used {
        println!("    ⚠️ selection was empty — fell back to document order");
    }
    println!("  evidence found   : {}", run.evidence.len());
    if run.extract_no_yield > 0 {
        println!("  chunks w/o yield : {}", run.extract_no_yield);
    }
    if run.skipped_items() > 0 {
        println!(
            "  ⚠️ skipped items  : {} (scan: {}, extract: {})",
            run.skipped_items(),
            run.scan_failures.len(),
            run.extract_failures.len()
        );
    }
}

fn print_answer(run: &RunState) {
    println!();
    println!("══════════════════════════════════════════════════════");
    println!("                      ANSWER");
    println!("══════════════════════════════════════════════════════");
    println!();
    if let Some(answer) = &run.answer {
        println!("{}", answer.text);
    }
    println!();
    println!("══════════════════════════════════════════════════════");
}

fn print_failure(run: &RunState) {
    eprintln!();
    match &run.failure {
        Some(failure) => {
            eprintln!("❌ run failed at the {} stage: {}", failure.stage, failure.cause)
        }
        None => eprintln!("❌ run failed"),
    }
    eprintln!(
        "   progress before failure: {} chunk(s), {} summary(ies), {} evidence excerpt(s)",
        run.chunks.len(),
        run.summaries.len(),
        run.evidence.len()
    );
}
