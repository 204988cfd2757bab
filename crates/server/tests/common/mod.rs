//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock collaborators injected, so the queue, the worker and the HTTP
//! surface can be exercised without an LLM, a TTS binary or the network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use phrasebook_core::{
    load_config_from_str,
    testing::{MockAnnotator, MockAudioService, MockSentenceGenerator},
    Config, ContentPipeline, Database, GenerationQueue, GenerationWorker, MemoryDictionary,
    SqliteJobStore, SqliteVocabularyStore, StatusNotifier, VocabularyStore, WorkerConfig,
};
use phrasebook_server::api::WsBroadcaster;

/// Re-export fixtures for test convenience
pub use phrasebook_core::testing::fixtures;

/// Test fixture with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_generate() {
///     let fixture = TestFixture::new().await;
///     let word_id = fixture.add_word("perro");
///
///     let response = fixture.post(&format!("/api/v1/words/{}/generate", word_id), json!({})).await;
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct access to words and sentences
    pub vocabulary: Arc<SqliteVocabularyStore>,
    /// Mock sentence generator - control candidates and failures
    pub generator: MockSentenceGenerator,
    /// Mock audio service
    pub audio: MockAudioService,
    pub worker: Arc<GenerationWorker>,
    pub ws_broadcaster: WsBroadcaster,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture; the worker is not started.
    pub async fn new() -> Self {
        Self::with_worker_config(WorkerConfig {
            enabled: false,
            poll_interval_ms: 10,
            backoff_base_ms: 0,
            ..WorkerConfig::default()
        })
        .await
    }

    /// Create a test fixture with a custom worker configuration.
    pub async fn with_worker_config(worker_config: WorkerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(&format!(
            r#"
[generator]
provider = "anthropic"
model = "claude-3-haiku-20240307"
api_key = "sk-test-secret"

[database]
path = {:?}

[audio.voices]
es = "es"
"#,
            db_path.display().to_string()
        ))
        .expect("Failed to parse test config");
        let config = Config {
            worker: worker_config.clone(),
            ..config
        };

        // Stores
        let db = Database::open(&db_path).expect("Failed to open database");
        let vocabulary = Arc::new(SqliteVocabularyStore::new(db.clone()));
        let jobs = Arc::new(
            SqliteJobStore::new(db).with_backoff_gate(worker_config.enforce_backoff_gate),
        );

        // Mocks
        let generator = MockSentenceGenerator::new();
        let audio = MockAudioService::new();

        let ws_broadcaster = WsBroadcaster::default();
        let notifier: Arc<dyn StatusNotifier> = Arc::new(ws_broadcaster.clone());

        let pipeline = ContentPipeline::new(
            vocabulary.clone(),
            Arc::new(generator.clone()),
            Arc::new(audio.clone()),
            Arc::new(MockAnnotator::new()),
            Arc::new(MemoryDictionary::new()),
            Arc::clone(&notifier),
        );
        let queue = Arc::new(GenerationQueue::new(
            jobs.clone(),
            vocabulary.clone(),
            Arc::clone(&notifier),
            worker_config.default_sentence_count,
        ));
        let worker = Arc::new(GenerationWorker::new(
            worker_config,
            jobs,
            vocabulary.clone(),
            pipeline,
            notifier,
        ));

        let state = Arc::new(phrasebook_server::state::AppState::new(
            config,
            queue,
            Arc::clone(&worker),
            ws_broadcaster.clone(),
        ));
        let router = phrasebook_server::api::create_router(state);

        Self {
            router,
            vocabulary,
            generator,
            audio,
            worker,
            ws_broadcaster,
            temp_dir,
        }
    }

    /// Insert a Spanish word and return its ID.
    pub fn add_word(&self, text: &str) -> i64 {
        self.vocabulary
            .insert_word(fixtures::spanish_word(text))
            .expect("Failed to insert word")
            .id
    }

    /// Poll the job endpoint until the job reaches `status`.
    pub async fn wait_for_job_status(&self, word_id: i64, status: &str) -> TestResponse {
        let path = format!("/api/v1/words/{}/job", word_id);
        for _ in 0..200 {
            let response = self.get(&path).await;
            if response.body["status"] == status {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job for word {} never reached status {}", word_id, status);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
