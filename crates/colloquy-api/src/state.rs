//! Application state wiring all services together.
//!
//! AppState holds the concrete service instance used by both CLI and REST
//! API. The chat service is generic over repository/provider/cache traits,
//! but AppState pins it to the concrete infra implementations.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use colloquy_core::chat::ChatService;
use colloquy_core::context::ContextAssembler;
use colloquy_core::llm::ModelCatalog;
use colloquy_core::quota::{QuotaLedger, TierAllotments};
use colloquy_core::thread::ThreadStore;
use colloquy_infra::cache::InMemoryThreadListCache;
use colloquy_infra::config::{load_service_config, resolve_data_dir};
use colloquy_infra::llm::anthropic::AnthropicProvider;
use colloquy_infra::sqlite::account::SqliteAccountRepository;
use colloquy_infra::sqlite::pool::DatabasePool;
use colloquy_infra::sqlite::thread::SqliteThreadRepository;
use colloquy_infra::sqlite::usage::SqliteUsageRepository;
use colloquy_types::config::ServiceConfig;

/// Concrete type alias for the service generics pinned to infra
/// implementations.
pub type ConcreteChatService = ChatService<
    SqliteAccountRepository,
    SqliteThreadRepository,
    SqliteUsageRepository,
    AnthropicProvider,
    InMemoryThreadListCache,
>;

/// Shared application state holding the chat service and database pool.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
    pub config: ServiceConfig,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire the chat service.
    ///
    /// The provider credential comes from `ANTHROPIC_API_KEY`; CLI
    /// commands that never generate work without it, so a missing key is
    /// only rejected by `serve`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_service_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("colloquy.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let provider = AnthropicProvider::new(SecretString::from(api_key));

        let chat_service = ChatService::new(
            QuotaLedger::new(
                SqliteAccountRepository::new(db_pool.clone()),
                TierAllotments::from(&config.quota),
            ),
            ThreadStore::new(SqliteThreadRepository::new(db_pool.clone())),
            SqliteUsageRepository::new(db_pool.clone()),
            provider,
            InMemoryThreadListCache::new(),
            ContextAssembler::new(
                config.context.system_prompt.clone(),
                config.context.max_history_turns,
            ),
            ModelCatalog::from_config(&config.models, &config.default_model.0),
            Duration::from_secs(config.cache.thread_list_ttl_secs),
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            db_pool,
            config,
        })
    }
}
