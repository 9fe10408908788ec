use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use gripe::config::{AnalysisConfig, Config, EmbedderBackend};
use gripe::embedding::download;
use gripe::embedding::hashing::HashingEmbedder;
use gripe::embedding::onnx::OnnxEmbedder;
use gripe::embedding::traits::Embedder;
use gripe::model::Review;
use gripe::output::{markdown, terminal};
use gripe::pipeline::{CancelFlag, NoopProgress, Pipeline, ProgressSink, Stage};

/// Gripe: complaint clustering and ranking for app reviews.
///
/// Takes a batch of scraped reviews, keeps the negative ones, groups them
/// into complaint themes, and ranks the themes by how big and how recent
/// they are.
#[derive(Parser)]
#[command(name = "gripe", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a JSON file of reviews and print ranked complaint categories
    Analyze {
        /// Path to a JSON array of review objects
        input: PathBuf,

        /// Print the full result as JSON instead of the terminal report
        #[arg(long)]
        json: bool,

        /// Also write a markdown report to this path
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Minimum reviews per cluster (default: 4% of the negative count)
        #[arg(long)]
        min_cluster_size: Option<usize>,

        /// Minimum negative reviews required to attempt clustering (default: 5)
        #[arg(long)]
        min_negative: Option<usize>,

        /// Soft per-stage timeout in seconds (default: 120)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Download the ONNX sentence-embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gripe=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            json,
            markdown: markdown_path,
            min_cluster_size,
            min_negative,
            timeout,
        } => {
            let config = Config::load()?;
            let embedder = build_embedder(&config)?;

            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let reviews: Vec<Review> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse reviews from {}", input.display()))?;
            info!(count = reviews.len(), "Loaded reviews");

            let mut analysis_config = AnalysisConfig {
                min_cluster_size,
                ..AnalysisConfig::default()
            };
            if let Some(min_negative) = min_negative {
                analysis_config.min_negative_reviews = min_negative;
            }
            if let Some(timeout) = timeout {
                analysis_config.stage_timeout_secs = timeout;
            }

            let pipeline = Pipeline::new(embedder)?;
            let cancel = CancelFlag::new();

            let result = if json {
                // Keep stdout clean for the JSON payload
                pipeline
                    .analyze(reviews, &analysis_config, &NoopProgress, &cancel)
                    .await?
            } else {
                let progress = CliProgress::new();
                let result = pipeline
                    .analyze(reviews, &analysis_config, &progress, &cancel)
                    .await;
                progress.finish();
                result?
            };

            if let Some(path) = markdown_path {
                std::fs::write(&path, markdown::render_report(&result))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Markdown report written to {}", path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                terminal::display_analysis(&result);
                if result.status.is_insufficient() {
                    println!(
                        "{}",
                        "Tip: lower --min-negative or collect more reviews.".dimmed()
                    );
                }
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            download::download_model(&config.model_dir).await?;
            println!("\nModel ready in {}", config.model_dir.display());
            println!("Run: cargo run -- analyze <reviews.json>");
        }
    }

    Ok(())
}

/// Construct the embedding backend chosen by the environment.
fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedder_backend {
        EmbedderBackend::Onnx => {
            config.require_embedder()?;
            Ok(Arc::new(OnnxEmbedder::load(&config.model_dir)?))
        }
        EmbedderBackend::Hashing => {
            info!("Using the model-free hashing embedder");
            Ok(Arc::new(HashingEmbedder::default()))
        }
    }
}

/// Progress sink that drives a single terminal progress bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:30}] {pos:>3}% {msg}")
                .expect("valid template")
                .progress_chars("=> "),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for CliProgress {
    fn on_progress(&self, stage: Stage, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(format!("{stage}: {message}"));
    }
}
