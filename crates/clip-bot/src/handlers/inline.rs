//! Inline queries: offer an editable control surface for the request.

use tracing::{debug, info};

use clip_models::{parse_with_default_duration, ControlState};

use super::BotContext;
use crate::error::{BotError, BotResult};
use crate::keyboard::control_surface;
use crate::telegram::InlineQuery;
use crate::transport::{CachedPhotoResult, InputMedia, MediaKind};

impl BotContext {
    pub async fn handle_inline_query(&self, query: &InlineQuery) -> BotResult<()> {
        let request = match parse_with_default_duration(&query.query, self.default_duration_secs) {
            Ok(Some(request)) => request,
            Ok(None) => return self.transport.answer_inline(&query.id, Vec::new()).await,
            Err(e) => {
                debug!(query = %query.query, error = %e, "Inline query not usable");
                return self.transport.answer_inline(&query.id, Vec::new()).await;
            }
        };
        info!(user_id = query.from.id, request = %request, "Inline query");

        let thumbnail = match self.thumbnails.fetch(&request.source_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.transport.answer_inline(&query.id, Vec::new()).await?;
                return Err(e);
            }
        };

        let stored = self
            .transport
            .send_media(
                self.channel_id,
                InputMedia::upload(MediaKind::Photo, "thumbnail.jpg", thumbnail),
                None,
                None,
            )
            .await?;
        let photo_file_id = stored
            .file_id
            .ok_or_else(|| BotError::api("sendPhoto", "stored photo has no file id"))?;

        let state = ControlState::new(query.from.id, request);
        let result = CachedPhotoResult {
            id: uuid::Uuid::new_v4().to_string(),
            photo_file_id,
            caption: state.request.query_text(),
            keyboard: control_surface(&state),
        };
        self.transport.answer_inline(&query.id, vec![result]).await
    }
}
