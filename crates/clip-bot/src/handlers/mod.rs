//! Update handlers.
//!
//! Every handler owns its failure boundary: errors are returned to the
//! dispatcher, which logs them, and never affect other updates.

mod callback;
mod edited;
mod inline;
mod message;

use std::sync::Arc;

use clip_models::MediaClass;

use crate::cache::RecentResultCache;
use crate::error::BotResult;
use crate::telegram::Update;
use crate::thumbnail::ThumbnailFetcher;
use crate::transport::{InputMedia, MediaKind, Transport};
use crate::worker::RenderWorker;

/// Key of a remembered result: the chat and the message that requested it.
pub type ResultKey = (i64, i64);

/// Everything the handlers share.
pub struct BotContext {
    pub transport: Arc<dyn Transport>,
    pub worker: RenderWorker,
    /// Originating message to the result sent for it
    pub results: RecentResultCache<ResultKey, i64>,
    pub thumbnails: ThumbnailFetcher,
    /// Storage chat uploads go to before they are attached to inline messages
    pub channel_id: i64,
    pub default_duration_secs: f64,
}

impl BotContext {
    /// Route an update to its handler.
    pub async fn handle_update(&self, update: Update) -> BotResult<()> {
        if let Some(message) = update.message {
            self.handle_message(&message).await
        } else if let Some(message) = update.edited_message {
            self.handle_edited_message(&message).await
        } else if let Some(query) = update.inline_query {
            self.handle_inline_query(&query).await
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(&callback).await
        } else {
            Ok(())
        }
    }
}

/// Upload of a rendered clip.
fn clip_media(class: MediaClass, bytes: Vec<u8>) -> InputMedia {
    match class {
        MediaClass::Audio => InputMedia::upload(MediaKind::Audio, "clip.mp3", bytes),
        MediaClass::Video | MediaClass::Preview => {
            InputMedia::upload(MediaKind::Video, "clip.mp4", bytes)
        }
    }
}
