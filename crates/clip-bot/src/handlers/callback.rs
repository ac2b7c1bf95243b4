//! Control surface presses.

use tracing::{debug, info, warn};

use clip_models::{decode, transition, ControlState, MediaClass, Transition};

use super::{clip_media, BotContext};
use crate::error::{BotError, BotResult};
use crate::keyboard::{control_surface, loading};
use crate::telegram::CallbackQuery;
use crate::transport::{InputMedia, MessageTarget};

/// Notice for payloads that no longer decode.
const STALE_BUTTON: &str = "This button is no longer valid";

impl BotContext {
    pub async fn handle_callback(&self, callback: &CallbackQuery) -> BotResult<()> {
        let Some(data) = callback.data.as_deref() else {
            return self.transport.answer_callback(&callback.id, None).await;
        };

        let payload = match decode(data) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "Undecodable control payload");
                return self
                    .transport
                    .answer_callback(&callback.id, Some(STALE_BUTTON))
                    .await;
            }
        };

        let next = match transition(&payload, callback.from.id) {
            Ok(next) => next,
            Err(e) => {
                info!(
                    owner_id = e.owner_id,
                    actor_id = e.actor_id,
                    "Rejected press from non-owner"
                );
                return self
                    .transport
                    .answer_callback(&callback.id, Some(&e.to_string()))
                    .await;
            }
        };
        self.transport.answer_callback(&callback.id, None).await?;

        let Some(target) = target_of(callback) else {
            warn!("Callback without an editable message");
            return Ok(());
        };

        match next {
            Transition::NoOp => Ok(()),
            Transition::Refresh(state) => {
                self.transport
                    .edit_reply_markup(&target, &control_surface(&state))
                    .await
            }
            Transition::Adjusted(state) => {
                self.transport
                    .edit_caption(
                        &target,
                        &state.request.query_text(),
                        Some(&control_surface(&state)),
                    )
                    .await
            }
            Transition::Render { state, class } => self.render_into(&target, state, class).await,
        }
    }

    /// Render the state's range and attach it to the controlled message.
    async fn render_into(
        &self,
        target: &MessageTarget,
        state: ControlState,
        class: MediaClass,
    ) -> BotResult<()> {
        let request = &state.request;
        let surface = control_surface(&state);
        info!(request = %request, media_class = %class, "Render pressed");

        if class != MediaClass::Preview {
            self.transport
                .edit_caption(target, &request.start_timestamp_url(), Some(&loading(request)))
                .await?;
        }

        let bytes = match self.worker.render(request.clone(), class).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(request = %request, error = %e, "Render failed");
                let caption = format!("{}\n\n{}", request.query_text(), e.user_message());
                return self
                    .transport
                    .edit_caption(target, &caption, Some(&surface))
                    .await;
            }
        };

        if let Err(e) = self.attach_clip(target, &state, class, bytes).await {
            warn!(request = %request, error = %e, "Delivering clip failed");
            let caption = format!("{}\n\n{}", request.query_text(), e.user_message());
            if let Err(restore) = self.transport.edit_caption(target, &caption, Some(&surface)).await {
                warn!(error = %restore, "Restoring controls failed");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Store the rendered clip in the channel and swap it into the target.
    async fn attach_clip(
        &self,
        target: &MessageTarget,
        state: &ControlState,
        class: MediaClass,
        bytes: Vec<u8>,
    ) -> BotResult<()> {
        let request = &state.request;
        let upload = clip_media(class, bytes);
        let kind = upload.kind();
        let stored = self
            .transport
            .send_media(self.channel_id, upload, None, None)
            .await?;
        let file_id = stored
            .file_id
            .ok_or_else(|| BotError::api("sendMedia", "stored clip has no file id"))?;
        let media = InputMedia::FileId { kind, file_id };

        match class {
            MediaClass::Preview => {
                self.transport
                    .edit_media(target, media, &request.query_text(), Some(&control_surface(state)))
                    .await
            }
            MediaClass::Video | MediaClass::Audio => {
                self.transport
                    .edit_media(target, media, &request.start_timestamp_url(), None)
                    .await
            }
        }
    }
}

fn target_of(callback: &CallbackQuery) -> Option<MessageTarget> {
    if let Some(id) = &callback.inline_message_id {
        return Some(MessageTarget::Inline(id.clone()));
    }
    callback.message.as_ref().map(|message| MessageTarget::Chat {
        chat_id: message.chat.id,
        message_id: message.message_id,
    })
}
