//! Test harness for database lifecycle management and service mocks.
//!
//! Each `TestHarness` creates an isolated embedded database in a temporary
//! directory; the directory is cleaned up when the harness is dropped.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use concierge::config::DatabaseConfig;
use concierge::db::connection::{init_db, ConciergeDb};
use concierge::db::schema::apply_schema;
use concierge::memory::{LongMemory, MediumMemory, VectorCapability};
use concierge::orchestrator::Orchestrator;
use concierge::services::{
    CompletionRequest, CompletionService, GeneratedAsset, ImageRequest, ImageService,
    MessagingService, NoopCalendarSync, OutboundMessage,
};
use concierge::ConciergeError;

pub struct TestHarness {
    pub db: Arc<ConciergeDb>,
    pub temp_dir: TempDir,
}

impl TestHarness {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test database");
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig::Embedded {
            path: Some(db_path.to_string_lossy().into_owned()),
        };
        let db = init_db(&config, temp_dir.path())
            .await
            .expect("Failed to initialize test database");
        apply_schema(&db)
            .await
            .expect("Failed to apply schema to test database");
        Self {
            db: Arc::new(db),
            temp_dir,
        }
    }
}

/// Completion mock returning a canned reply; embeddings always fail so
/// memory indexing exercises its lexical-only path.
pub struct MockCompletion {
    pub reply: String,
}

impl MockCompletion {
    pub fn saying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
        })
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ConciergeError> {
        Ok(self.reply.clone())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ConciergeError> {
        Err(ConciergeError::Unavailable("no embeddings in tests".to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Completion mock that always fails, for fallback-path tests.
pub struct FailingCompletion;

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ConciergeError> {
        Err(ConciergeError::Completion("boom".to_string()))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ConciergeError> {
        Err(ConciergeError::Completion("boom".to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Completion mock for a backend that was never configured.
pub struct UnconfiguredCompletion;

#[async_trait]
impl CompletionService for UnconfiguredCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ConciergeError> {
        Err(ConciergeError::Unavailable(
            "completion backend is not configured".to_string(),
        ))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ConciergeError> {
        Err(ConciergeError::Unavailable(
            "completion backend is not configured".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Image mock that records prompts and returns a fixed hosted asset.
pub struct MockImage {
    pub prompts: Mutex<Vec<String>>,
    pub fail_times: Mutex<usize>,
}

impl MockImage {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_times: Mutex::new(0),
        })
    }

    pub fn failing_first(times: usize) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_times: Mutex::new(times),
        })
    }
}

#[async_trait]
impl ImageService for MockImage {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedAsset, ConciergeError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let mut remaining = self.fail_times.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ConciergeError::Image("render timeout".to_string()));
        }
        Ok(GeneratedAsset {
            url: Some("https://assets.example.com/creative.png".to_string()),
            inline: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Messaging mock that records every dispatched message.
pub struct RecordingMessaging {
    pub sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingMessaging {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MessagingService for RecordingMessaging {
    async fn dispatch(&self, message: OutboundMessage) -> Result<(), ConciergeError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Build a fully wired orchestrator over the harness database with the
/// given completion and image mocks.
pub fn orchestrator(
    harness: &TestHarness,
    completion: Arc<dyn CompletionService>,
    image: Arc<dyn ImageService>,
) -> Arc<Orchestrator> {
    let medium = Arc::new(MediumMemory::with_defaults());
    let long = Arc::new(LongMemory::new(
        harness.db.clone(),
        completion.clone(),
        VectorCapability::Unavailable,
    ));
    Arc::new(Orchestrator::new(
        harness.db.clone(),
        completion,
        image,
        Arc::new(NoopCalendarSync),
        medium,
        long,
        12,
    ))
}
