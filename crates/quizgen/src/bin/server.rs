//! Quiz server binary
//!
//! Run with: cargo run -p quizgen --bin quizgen-server -- --config quizgen.toml

use clap::Parser;
use std::path::PathBuf;

use quizgen::{config::QuizConfig, ingestion::DecoderKind, server::QuizServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "quizgen-server", version, about = "Study material to quiz server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizgen=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         Quizgen                           ║
║            Study Material to Quiz Generator               ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let mut config = QuizConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - OCR language: {}", config.extraction.ocr_language);
    tracing::info!("  - Supported formats: {}", DecoderKind::supported_list());

    let server = QuizServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/parse-files   - Extract text from uploads");
    println!("  POST /api/generate-quiz - Generate questions");
    println!("  GET  /api/quizzes       - List saved quizzes");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
