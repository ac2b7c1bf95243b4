//! Render worker pool.
//!
//! Renders run on their own tasks, at most `max_concurrent` at a time, so a
//! slow render never holds up update handling. The heavy lifting happens in
//! yt-dlp and FFmpeg child processes.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error};

use clip_media::ClipOrchestrator;
use clip_models::{MediaClass, Request};

use crate::error::{BotError, BotResult};

#[derive(Clone)]
pub struct RenderWorker {
    orchestrator: Arc<ClipOrchestrator>,
    permits: Arc<Semaphore>,
}

impl RenderWorker {
    pub fn new(orchestrator: ClipOrchestrator, max_concurrent: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Render `request` as `class` on a worker task.
    pub async fn render(&self, request: Request, class: MediaClass) -> BotResult<Vec<u8>> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BotError::worker("Semaphore closed"))?;
        debug!(source_id = %request.source_id, media_class = %class, "Render slot acquired");

        let orchestrator = Arc::clone(&self.orchestrator);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            orchestrator.produce(&request, class).await
        });

        match handle.await {
            Ok(result) => Ok(result?),
            Err(e) => {
                error!("Render task failed: {}", e);
                Err(BotError::worker(e.to_string()))
            }
        }
    }

    /// Renders that could start right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}
