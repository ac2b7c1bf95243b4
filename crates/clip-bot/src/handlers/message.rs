//! New text messages: render the requested clip as a reply.

use tracing::{info, warn};

use clip_models::{parse_request, parse_with_default_duration, MediaClass, ParseError, Request};

use super::{clip_media, BotContext};
use crate::error::BotResult;
use crate::telegram::Message;
use crate::transport::ChatAction;

impl BotContext {
    pub async fn handle_message(&self, message: &Message) -> BotResult<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        let request = match self.parse_text(text) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => {
                self.transport
                    .send_text(chat_id, &e.to_string(), Some(message.message_id))
                    .await?;
                return Ok(());
            }
        };
        info!(chat_id = chat_id, request = %request, "Clip requested");

        self.transport
            .send_chat_action(chat_id, ChatAction::UploadVideo)
            .await?;

        let bytes = match self.worker.render(request.clone(), MediaClass::Video).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(chat_id = chat_id, error = %e, "Render failed");
                self.transport
                    .send_text(chat_id, &e.user_message(), Some(message.message_id))
                    .await?;
                return Ok(());
            }
        };

        let sent = self
            .transport
            .send_media(
                chat_id,
                clip_media(MediaClass::Video, bytes),
                Some(&request.start_timestamp_url()),
                Some(message.message_id),
            )
            .await?;
        self.results
            .remember((chat_id, message.message_id), sent.message_id);
        Ok(())
    }

    /// Parse a chat message, appending the default duration when no range is given.
    ///
    /// The text is parsed as written first so that its own range errors are
    /// the ones reported.
    pub(crate) fn parse_text(&self, text: &str) -> Result<Option<Request>, ParseError> {
        match parse_request(text)? {
            Some(request) => Ok(Some(request)),
            None => parse_with_default_duration(text, self.default_duration_secs),
        }
    }
}
