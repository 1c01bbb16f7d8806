use std::sync::Arc;

use rig::client::EmbeddingsClient;
use rig::providers::gemini;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sitechat::chunker::TextChunker;
use sitechat::config::Config;
use sitechat::fetcher::PageFetcher;
use sitechat::generator::{AnswerGenerator, GeminiCompletion};
use sitechat::pipeline::RagPipeline;
use sitechat::server::{AppState, router};
use sitechat::store::SqliteChunkStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    let client = gemini::Client::new(&config.api_key)?;
    let embedder = client.embedding_model(&config.embedding_model);
    let generator = AnswerGenerator::new(GeminiCompletion::new(
        &client,
        &config.generation_model,
    ));

    std::fs::create_dir_all(&config.dataset)?;
    let store = SqliteChunkStore::open(config.store_path(), &embedder).await?;
    let fetcher = PageFetcher::new(config.fetch_timeout, &config.scratch_dir)?;
    let chunker = TextChunker::new(config.chunk_max_chars, config.chunk_overlap_chars)?;

    let pipeline = RagPipeline::new(
        fetcher,
        chunker,
        embedder,
        store,
        generator,
        config.top_k,
    );
    let state = Arc::new(AppState { pipeline });

    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!("serving on http://{}", config.bind);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
