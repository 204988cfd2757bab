use std::sync::Arc;

use phrasebook_core::{Config, GenerationQueue, GenerationWorker, SanitizedConfig};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    queue: Arc<GenerationQueue>,
    worker: Arc<GenerationWorker>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        queue: Arc<GenerationQueue>,
        worker: Arc<GenerationWorker>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            queue,
            worker,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn queue(&self) -> &GenerationQueue {
        self.queue.as_ref()
    }

    pub fn worker(&self) -> &GenerationWorker {
        self.worker.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
