//! Lingua - Translation Router Command Line
//!
//! Entry point for the lingua translation service. Builds one service
//! context from configuration and serves requests from the command line
//! or from stdin as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! # Translate one text
//! lingua translate --from en --to de "Hello world"
//!
//! # Stream JSON-lines requests
//! cat requests.jsonl | lingua batch --concurrency 16
//!
//! # Cache commands ride along in the same stream
//! echo '{"command":"cache_stats","top":5}' | lingua batch
//!
//! # Inspect
//! lingua pairs
//! lingua config
//! lingua stats
//!
//! # Verbose logging
//! RUST_LOG=lingua_core=debug lingua translate --from en --to ja "Hello"
//! ```
//!
//! Logs go to stderr; stdout carries only results.

mod batch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use lingua_core::{
    default_config_path, load_config_from_path, BackendPreference, LinguaConfig,
    TranslateRequest, TranslationService,
};

/// Lingua - route translations across local models, hosted APIs and providers
#[derive(Parser, Debug)]
#[command(name = "lingua")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "LINGUA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "LINGUA_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Skip loading the configured preload pairs at startup
    #[arg(long)]
    no_preload: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate one text and print the result as JSON
    Translate {
        /// Source language code
        #[arg(long = "from", value_name = "CODE")]
        source: String,

        /// Target language code
        #[arg(long = "to", value_name = "CODE")]
        target: String,

        /// Free-form context passed to backends that accept it
        #[arg(long)]
        context: Option<String>,

        /// Backends allowed to answer (auto, local, remote, provider)
        #[arg(long, default_value = "auto")]
        prefer: BackendPreference,

        /// Text to translate
        text: String,
    },

    /// Translate JSON-lines requests from stdin
    ///
    /// Lines with a "command" field (cache_stats, cache_purge, cache_clear)
    /// manage the result cache of this run instead of translating.
    Batch {
        /// Requests in flight at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },

    /// List supported language pairs
    Pairs,

    /// Print the effective configuration
    Config,

    /// Print service statistics as JSON
    Stats,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lingua_daemon={level},lingua_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &Args) -> Result<LinguaConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let config = load_config_from_path(path).context("Failed to load configuration")?;
    info!(
        source = %config.source(),
        path = ?config.config_file_path,
        "Configuration loaded"
    );
    Ok(config)
}

async fn build_service(config: &LinguaConfig, preload: bool) -> Result<Arc<TranslationService>> {
    let service =
        TranslationService::from_config(config).context("Failed to build translation service")?;
    if preload {
        let report = service.preload().await;
        for (pair, reason) in &report.failed {
            warn!(pair = %pair, reason = %reason, "Preload failed");
        }
    }
    Ok(Arc::new(service))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render JSON")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load(&args)?;
    let preload = !args.no_preload;

    match args.command {
        Command::Translate {
            source,
            target,
            context,
            prefer,
            text,
        } => {
            // A single request loads only the pair it needs
            let service = build_service(&config, false).await?;
            let request = TranslateRequest::new(source, target, text)
                .with_context(context.unwrap_or_default())
                .with_preference(prefer);

            let code = match service.translate(&request).await {
                Ok(result) => {
                    print_json(&result)?;
                    if result.is_success() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    print_json(&e.report())?;
                    ExitCode::from(2)
                }
            };
            service.shutdown();
            Ok(code)
        }

        Command::Batch { concurrency } => {
            let service = build_service(&config, preload).await?;
            let summary = batch::run(Arc::clone(&service), concurrency).await?;
            service.shutdown();
            Ok(if summary.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Pairs => {
            let service = build_service(&config, false).await?;
            for descriptor in service.descriptors() {
                println!(
                    "{}\t{}\t{}",
                    descriptor.pair, descriptor.kind, descriptor.backend_id
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Config => {
            println!("# source: {}", config.source());
            if let Some(path) = &config.config_file_path {
                println!("# file: {}", path.display());
            }
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to render configuration")?
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Stats => {
            let service = build_service(&config, preload).await?;
            print_json(&service.snapshot())?;
            service.shutdown();
            Ok(ExitCode::SUCCESS)
        }
    }
}
