//! In-process API tests with mock collaborators.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};
use phrasebook_core::{ProcessingStatus, VocabularyStore, WorkerConfig};
use phrasebook_server::api::WsMessage;

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_redacts_api_key() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["generator"]["provider"], "anthropic");
    assert_eq!(response.body["generator"]["api_key_configured"], true);
    assert!(!response.body.to_string().contains("sk-test-secret"));
}

// =============================================================================
// Enqueue and status
// =============================================================================

#[tokio::test]
async fn test_generate_queues_word() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("perro");

    let response = fixture
        .post(
            &format!("/api/v1/words/{}/generate", word_id),
            json!({ "topic": "pets", "desired_sentence_count": 2 }),
        )
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["word_id"], word_id);
    assert_eq!(response.body["status"], "queued");
    assert_eq!(response.body["language"], "es");
    assert_eq!(response.body["topic"], "pets");
    assert_eq!(response.body["desired_sentence_count"], 2);
    assert_eq!(response.body["attempts"], 0);

    let status = fixture
        .get(&format!("/api/v1/words/{}/status", word_id))
        .await;
    assert_status!(status, StatusCode::OK);
    assert_eq!(status.body["processing_status"], "queued");
    assert_eq!(status.body["sentence_count"], 0);
}

#[tokio::test]
async fn test_generate_without_body_uses_defaults() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("gato");

    let response = fixture
        .post_empty(&format!("/api/v1/words/{}/generate", word_id))
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(response.body["desired_sentence_count"], 3);
    assert!(response.body.get("topic").is_none());
}

#[tokio::test]
async fn test_generate_unknown_word() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/words/999/generate", json!({})).await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_generate_zero_sentences_rejected() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("casa");

    let response = fixture
        .post(
            &format!("/api/v1/words/{}/generate", word_id),
            json!({ "desired_sentence_count": 0 }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_of_unknown_word() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/words/12345/status").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_job_of_word_never_queued() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("luz");

    let response = fixture.get(&format!("/api/v1/words/{}/job", word_id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_queue_summary() {
    let fixture = TestFixture::new().await;
    let first = fixture.add_word("uno");
    let second = fixture.add_word("dos");
    let german = fixture
        .vocabulary
        .insert_word(phrasebook_core::vocabulary::NewWord::new("Hund", "de"))
        .unwrap()
        .id;

    for word_id in [first, second, german] {
        let response = fixture
            .post(&format!("/api/v1/words/{}/generate", word_id), json!({}))
            .await;
        assert_status!(response, StatusCode::ACCEPTED);
    }

    let response = fixture.get("/api/v1/queue").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["queued"], 3);
    assert_eq!(response.body["processing"], 0);

    let response = fixture.get("/api/v1/queue?language=es").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["queued"], 2);
    let words: Vec<&str> = response.body["queued_words"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["text"].as_str().unwrap())
        .collect();
    assert_eq!(words, vec!["uno", "dos"]);
}

// =============================================================================
// Worker
// =============================================================================

#[tokio::test]
async fn test_worker_start_processes_queue_and_stop() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("perro");

    let status = fixture.get("/api/v1/worker/status").await;
    assert_status!(status, StatusCode::OK);
    assert_eq!(status.body["running"], false);

    fixture
        .post(&format!("/api/v1/words/{}/generate", word_id), json!({}))
        .await;

    let response = fixture.post_empty("/api/v1/worker/start").await;
    assert_status!(response, StatusCode::OK);

    let job = fixture.wait_for_job_status(word_id, "completed").await;
    assert_eq!(job.body["attempts"], 1);

    let status = fixture
        .get(&format!("/api/v1/words/{}/status", word_id))
        .await;
    assert_eq!(status.body["processing_status"], "ready");
    assert_eq!(status.body["sentence_count"], 3);

    let sentences = fixture.vocabulary.list_sentences(word_id).unwrap();
    assert_eq!(sentences.len(), 3);
    assert!(sentences.iter().all(|s| s.audio_path.is_some()));

    let response = fixture.post_empty("/api/v1/worker/stop").await;
    assert_status!(response, StatusCode::OK);

    let status = fixture.get("/api/v1/worker/status").await;
    assert_eq!(status.body["running"], false);
    assert_eq!(status.body["completed"], 1);
}

#[tokio::test]
async fn test_failed_job_reports_last_error() {
    let fixture = TestFixture::with_worker_config(WorkerConfig {
        enabled: false,
        poll_interval_ms: 10,
        backoff_base_ms: 0,
        max_attempts: 2,
        ..WorkerConfig::default()
    })
    .await;
    fixture.generator.set_always_fail(true).await;
    let word_id = fixture.add_word("nube");

    fixture
        .post(&format!("/api/v1/words/{}/generate", word_id), json!({}))
        .await;
    fixture.post_empty("/api/v1/worker/start").await;

    let job = fixture.wait_for_job_status(word_id, "failed").await;
    assert_eq!(job.body["attempts"], 2);
    assert!(job.body["last_error"]
        .as_str()
        .unwrap()
        .contains("mock failure"));

    let status = fixture
        .get(&format!("/api/v1/words/{}/status", word_id))
        .await;
    assert_eq!(status.body["processing_status"], "failed");

    // A failed word is left out of the queue listings
    let summary = fixture.get("/api/v1/queue").await;
    assert_eq!(summary.body["failed"], 1);
    assert_eq!(summary.body["queued_words"].as_array().unwrap().len(), 0);

    fixture.post_empty("/api/v1/worker/stop").await;
}

#[tokio::test]
async fn test_word_updates_are_broadcast() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.ws_broadcaster.subscribe();
    let word_id = fixture.add_word("sol");

    fixture
        .post(
            &format!("/api/v1/words/{}/generate", word_id),
            json!({ "desired_sentence_count": 1 }),
        )
        .await;
    let processed = fixture.worker.process_next().await.unwrap();
    assert!(processed.is_some());

    let mut statuses = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let WsMessage::WordUpdated {
            processing_status, ..
        } = msg
        {
            statuses.push(processing_status);
        }
    }
    assert_eq!(
        statuses,
        vec![
            Some(ProcessingStatus::Queued),
            Some(ProcessingStatus::Processing),
            Some(ProcessingStatus::Processing),
            Some(ProcessingStatus::Ready),
        ]
    );
}

#[tokio::test]
async fn test_worker_status_is_broadcast() {
    let fixture = TestFixture::new().await;
    let mut rx = fixture.ws_broadcaster.subscribe();

    fixture.post_empty("/api/v1/worker/start").await;
    fixture.post_empty("/api/v1/worker/stop").await;

    let mut running = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let WsMessage::WorkerStatus { running: r } = msg {
            running.push(r);
        }
    }
    assert_eq!(running, vec![true, false]);
}

#[tokio::test]
async fn test_existing_sentences_skip_generation() {
    let fixture = TestFixture::new().await;
    let word_id = fixture.add_word("agua");
    fixture
        .vocabulary
        .insert_sentence(fixtures::manual_sentence(word_id, "Bebo agua.", Some("/a.wav")))
        .unwrap();

    fixture
        .post(
            &format!("/api/v1/words/{}/generate", word_id),
            json!({ "desired_sentence_count": 1 }),
        )
        .await;
    fixture.worker.process_next().await.unwrap();

    assert_eq!(fixture.generator.call_count().await, 0);
    let status = fixture
        .get(&format!("/api/v1/words/{}/status", word_id))
        .await;
    assert_eq!(status.body["processing_status"], "ready");
    assert_eq!(status.body["sentence_count"], 1);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("phrasebook_http_requests_total"));
    assert!(body.contains("phrasebook_jobs_by_status"));
    assert!(body.contains("phrasebook_worker_running"));
}
