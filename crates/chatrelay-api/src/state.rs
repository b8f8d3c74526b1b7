//! Application state wiring the pipeline to its infrastructure.
//!
//! The pipeline is generic over store and backend traits; AppState pins
//! it to the concrete infra implementations and owns it for the process
//! lifetime. The cache lives inside the pipeline, constructed once here
//! at startup.

use std::sync::Arc;

use chatrelay_core::pipeline::ChatPipeline;
use chatrelay_infra::config::{self, RelayConfig};
use chatrelay_infra::ollama::OllamaBackend;
use chatrelay_infra::sqlite::message::SqliteMessageStore;
use chatrelay_infra::sqlite::pool::DatabasePool;

/// Concrete pipeline type pinned to the infra implementations.
pub type ConcretePipeline = ChatPipeline<SqliteMessageStore, OllamaBackend>;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConcretePipeline>,
}

impl AppState {
    /// Initialize the application state: connect to the database, run
    /// migrations, wire the store and backend into the pipeline.
    pub async fn init(config: &RelayConfig) -> anyhow::Result<Self> {
        let data_dir = config::resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(&config::database_url(&data_dir)).await?;

        let store = SqliteMessageStore::new(db_pool);
        let backend = OllamaBackend::new(config.ollama_url.clone(), config.model.clone());

        tracing::info!(
            model = %config.model,
            ollama_url = %config.ollama_url,
            data_dir = %data_dir.display(),
            "pipeline initialized"
        );

        Ok(Self {
            pipeline: Arc::new(ChatPipeline::new(store, backend)),
        })
    }
}
