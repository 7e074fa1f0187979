use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swiftvisa::api;
use swiftvisa::config::{Config, APP_NAME, APP_VERSION};
use swiftvisa::ingest;
use swiftvisa::state::AppState;

#[derive(Parser)]
#[command(name = "swiftvisa")]
#[command(about = "Visa eligibility API backed by a policy document corpus")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Clean, chunk and index the corpus, then exit
    Ingest {
        /// Index DATA_CLEAN_DIR as is instead of cleaning DATA_RAW_DIR into it first
        #[arg(long)]
        skip_clean: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| EnvFilter::try_new(level.to_lowercase()).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(config.log_json);

    tracing::info!("{APP_NAME} v{APP_VERSION}");
    tracing::info!("Corpus directory: {}", config.clean_dir.display());
    tracing::info!("Vector store directory: {}", config.vectorstore_dir.display());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Ingest { skip_clean } => {
            let state = AppState::new(config.clone())?;
            let index = state
                .index
                .ok_or_else(|| anyhow::anyhow!("Corpus index unavailable"))?;
            let report = ingest::run_ingest(&config, index, !skip_clean).await?;
            tracing::info!(
                "Ingest complete: {} cleaned, {} documents, {} chunks, {} embedded",
                report.cleaned,
                report.documents,
                report.chunks,
                report.embedded
            );
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config.clone())?;

    if state.resolver.llm_available() {
        tracing::info!(
            "LLM mode: {} ({}, model {})",
            config.llm.provider_label(),
            config.llm.base_url,
            config.llm.chat_model
        );
    } else {
        tracing::warn!("LLM mode: disabled, answers come from retrieval only");
    }

    // First run against a populated corpus: build the index without blocking startup
    if let Some(index) = state.index.clone() {
        if index.is_empty() && !state.catalog.entries().is_empty() {
            let ingest_config = config.clone();
            tokio::spawn(async move {
                tracing::info!("Corpus index is empty, indexing corpus in the background");
                if let Err(e) = ingest::run_ingest(&ingest_config, index, false).await {
                    tracing::error!("Background indexing failed: {e:#}");
                }
            });
        }
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
