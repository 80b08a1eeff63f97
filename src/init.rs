//! Shared initialization for CLI commands.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_app_config, AppConfig};
use crate::db::connection::{init_db, ConciergeDb};
use crate::db::schema::apply_schema;
use crate::memory::{LongMemory, MediumMemory, VectorCapability};
use crate::orchestrator::Orchestrator;
use crate::services::{
    CalendarSync, CompletionService, HttpMessagingService, ImageService, MessagingService,
    NoopCalendarSync, OpenAiCompletionService, OpenAiImageService,
};

/// Application context holding the store handle and all wired services.
pub struct AppContext {
    pub db: Arc<ConciergeDb>,
    pub data_path: PathBuf,
    pub config: AppConfig,
    pub completion: Arc<dyn CompletionService>,
    pub messaging: Arc<dyn MessagingService>,
    pub long_memory: Arc<LongMemory>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppContext {
    /// Initialize the application context.
    ///
    /// Data path priority: explicit path > CONCIERGE_DATA_PATH env >
    /// ./.concierge (if it exists) > ~/.concierge
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = explicit_path
            .or_else(|| std::env::var("CONCIERGE_DATA_PATH").ok().map(PathBuf::from))
            .or_else(|| {
                let local = Path::new(".concierge");
                (local.exists() && local.is_dir()).then(|| local.to_path_buf())
            })
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".concierge"))
                    .unwrap_or_else(|| PathBuf::from(".concierge"))
            });

        tracing::info!("Using data path: {}", data_path.display());

        let config = load_app_config(&data_path);

        let db = init_db(&config.database, &data_path).await?;
        tracing::info!("Database connected");

        apply_schema(&db).await?;
        tracing::info!("Schema applied");

        let db = Arc::new(db);

        let completion: Arc<dyn CompletionService> =
            Arc::new(OpenAiCompletionService::new(config.completion.clone()));
        let image: Arc<dyn ImageService> =
            Arc::new(OpenAiImageService::new(config.image.clone()));
        let messaging: Arc<dyn MessagingService> =
            Arc::new(HttpMessagingService::new(config.messaging.clone()));
        let calendar: Arc<dyn CalendarSync> = Arc::new(NoopCalendarSync);

        // Vector retrieval rides on the completion backend's embeddings.
        let vector = if completion.is_available() {
            VectorCapability::Available
        } else {
            tracing::warn!("No completion backend; memory retrieval is lexical-only");
            VectorCapability::Unavailable
        };

        let medium = Arc::new(MediumMemory::with_defaults());
        let long_memory = Arc::new(LongMemory::new(db.clone(), completion.clone(), vector));

        let orchestrator = Arc::new(Orchestrator::new(
            db.clone(),
            completion.clone(),
            image,
            calendar,
            medium,
            long_memory.clone(),
            config.session_idle_hours,
        ));

        Ok(Self {
            db,
            data_path,
            config,
            completion,
            messaging,
            long_memory,
            orchestrator,
        })
    }
}
