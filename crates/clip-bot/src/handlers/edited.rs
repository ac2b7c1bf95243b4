//! Edited messages: update the result already sent for the message in place.

use tracing::{debug, info, warn};

use clip_models::MediaClass;

use super::{clip_media, BotContext};
use crate::error::BotResult;
use crate::telegram::Message;
use crate::transport::{ChatAction, MessageTarget};

impl BotContext {
    pub async fn handle_edited_message(&self, message: &Message) -> BotResult<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let key = (chat_id, message.message_id);

        let known = self.results.lookup(&key).map(|message_id| MessageTarget::Chat {
            chat_id,
            message_id,
        });
        debug!(chat_id = chat_id, known = known.is_some(), "Message edited");

        let request = match self.parse_text(text) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => {
                match &known {
                    Some(target) => {
                        self.transport
                            .edit_caption(target, &e.to_string(), None)
                            .await?
                    }
                    None => {
                        self.transport
                            .send_text(chat_id, &e.to_string(), Some(message.message_id))
                            .await?;
                    }
                }
                return Ok(());
            }
        };
        info!(chat_id = chat_id, request = %request, "Clip re-requested");

        self.transport
            .send_chat_action(chat_id, ChatAction::UploadVideo)
            .await?;

        let bytes = match self.worker.render(request.clone(), MediaClass::Video).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(chat_id = chat_id, error = %e, "Render failed");
                match &known {
                    Some(target) => {
                        self.transport
                            .edit_caption(target, &e.user_message(), None)
                            .await?
                    }
                    None => {
                        self.transport
                            .send_text(chat_id, &e.user_message(), Some(message.message_id))
                            .await?;
                    }
                }
                return Ok(());
            }
        };

        let caption = request.start_timestamp_url();
        match known {
            Some(target) => {
                self.transport
                    .edit_media(&target, clip_media(MediaClass::Video, bytes), &caption, None)
                    .await?;
            }
            None => {
                let sent = self
                    .transport
                    .send_media(
                        chat_id,
                        clip_media(MediaClass::Video, bytes),
                        Some(&caption),
                        Some(message.message_id),
                    )
                    .await?;
                self.results.remember(key, sent.message_id);
            }
        }
        Ok(())
    }
}
