//! Mock sentence generator for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::generator::{GeneratedSentence, GenerationRequest, GeneratorError, SentenceGenerator};

/// Mock implementation of the SentenceGenerator trait.
///
/// Provides controllable behavior for testing:
/// - Track generation requests for assertions
/// - Fail the next N calls, or every call
/// - Return a fixed candidate list, or unique sentences per call
/// - Simulate slow generation
///
/// # Example
///
/// ```rust,ignore
/// use phrasebook_core::testing::MockSentenceGenerator;
///
/// let generator = MockSentenceGenerator::new();
/// generator.fail_next(2).await;
///
/// // First two calls fail, the third returns fresh sentences
/// let requests = generator.recorded_requests().await;
/// ```
#[derive(Debug, Clone)]
pub struct MockSentenceGenerator {
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
    fixed: Arc<RwLock<Option<Vec<GeneratedSentence>>>>,
    failures_left: Arc<RwLock<u32>>,
    always_fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Duration>>,
    counter: Arc<RwLock<u32>>,
}

impl Default for MockSentenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSentenceGenerator {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            fixed: Arc::new(RwLock::new(None)),
            failures_left: Arc::new(RwLock::new(0)),
            always_fail: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Return exactly these candidates on every call.
    pub async fn set_sentences(&self, sentences: Vec<GeneratedSentence>) {
        *self.fixed.write().await = Some(sentences);
    }

    /// Make the next `n` calls fail.
    pub async fn fail_next(&self, n: u32) {
        *self.failures_left.write().await = n;
    }

    pub async fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write().await = fail;
    }

    /// Simulated generation latency.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }
}

#[async_trait]
impl SentenceGenerator for MockSentenceGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> Option<&str> {
        Some("mock-model")
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedSentence>, GeneratorError> {
        self.requests.write().await.push(request.clone());
        let call = self.requests.read().await.len();

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.always_fail.read().await {
            return Err(GeneratorError::Http(format!("mock failure on call {}", call)));
        }
        {
            let mut failures_left = self.failures_left.write().await;
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(GeneratorError::Http(format!("mock failure on call {}", call)));
            }
        }

        if let Some(ref fixed) = *self.fixed.read().await {
            return Ok(fixed.clone());
        }

        let mut counter = self.counter.write().await;
        let sentences = (0..request.count)
            .map(|_| {
                *counter += 1;
                GeneratedSentence {
                    text: format!("{} ejemplo número {}.", request.word, *counter),
                    translation: Some(format!("{} example number {}.", request.word, *counter)),
                    source_audio_url: None,
                }
            })
            .collect();
        Ok(sentences)
    }
}
