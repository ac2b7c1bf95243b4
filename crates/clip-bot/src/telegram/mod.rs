//! Telegram Bot API client.
//!
//! JSON bodies for plain calls, multipart forms for uploads.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{BotError, BotResult};
use crate::transport::{
    CachedPhotoResult, ChatAction, InlineButton, InlineKeyboard, InputMedia, MediaKind,
    MessageTarget, SentMessage, Transport,
};

pub use types::{ApiResponse, CallbackQuery, Chat, InlineQuery, Message, Update, User};

/// Extra time allowed on top of the long polling timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout of regular calls, uploads included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Name of the multipart field uploads are attached as.
const ATTACHMENT: &str = "clip";

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> BotResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("clip-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> BotResult<T> {
        debug!(method = method, "Bot API call");
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        Self::parse_response(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> BotResult<T> {
        debug!(method = method, "Bot API upload");
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(method, response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> BotResult<T> {
        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;
        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(BotError::api(method, description));
        }
        body.result
            .ok_or_else(|| BotError::api(method, "response has no result"))
    }

    /// Edits of an unchanged message are rejected by the API; they are not failures here.
    async fn call_edit(&self, method: &str, body: &Value) -> BotResult<()> {
        ignore_not_modified(self.call::<Value>(method, body).await)
    }

    /// Long poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> BotResult<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "edited_message", "inline_query", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(timeout + POLL_GRACE)
            .json(&body)
            .send()
            .await?;
        Self::parse_response("getUpdates", response).await
    }
}

fn ignore_not_modified(result: BotResult<Value>) -> BotResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(BotError::Api { message, .. }) if message.contains("message is not modified") => Ok(()),
        Err(e) => Err(e),
    }
}

fn send_method(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "sendVideo",
        MediaKind::Audio => "sendAudio",
        MediaKind::Photo => "sendPhoto",
    }
}

/// Bot API representation of a keyboard.
pub fn keyboard_json(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match button {
                    InlineButton::Callback { text, data } => {
                        json!({ "text": text, "callback_data": data })
                    }
                    InlineButton::Url { text, url } => json!({ "text": text, "url": url }),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

fn target_fields(target: &MessageTarget) -> Map<String, Value> {
    let mut fields = Map::new();
    match target {
        MessageTarget::Chat {
            chat_id,
            message_id,
        } => {
            fields.insert("chat_id".to_string(), json!(chat_id));
            fields.insert("message_id".to_string(), json!(message_id));
        }
        MessageTarget::Inline(id) => {
            fields.insert("inline_message_id".to_string(), json!(id));
        }
    }
    fields
}

/// `reply_markup` value; an empty keyboard removes the buttons.
fn markup(keyboard: Option<&InlineKeyboard>) -> Value {
    keyboard_json(keyboard.unwrap_or(&InlineKeyboard::default()))
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> BotResult<SentMessage> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(reply_to) = reply_to {
            body["reply_to_message_id"] = json!(reply_to);
        }
        let message: Message = self.call("sendMessage", &body).await?;
        Ok(SentMessage {
            message_id: message.message_id,
            file_id: None,
        })
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> BotResult<()> {
        let body = json!({ "chat_id": chat_id, "action": action.as_str() });
        self.call::<Value>("sendChatAction", &body).await?;
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media: InputMedia,
        caption: Option<&str>,
        reply_to: Option<i64>,
    ) -> BotResult<SentMessage> {
        let kind = media.kind();
        let method = send_method(kind);

        let message: Message = match media {
            InputMedia::Upload {
                file_name, bytes, ..
            } => {
                let mut form = Form::new()
                    .text("chat_id", chat_id.to_string())
                    .part(kind.as_str(), Part::bytes(bytes).file_name(file_name));
                if let Some(caption) = caption {
                    form = form.text("caption", caption.to_string());
                }
                if let Some(reply_to) = reply_to {
                    form = form.text("reply_to_message_id", reply_to.to_string());
                }
                self.call_multipart(method, form).await?
            }
            InputMedia::FileId { file_id, .. } => {
                let mut body = json!({ "chat_id": chat_id });
                body[kind.as_str()] = json!(file_id);
                if let Some(caption) = caption {
                    body["caption"] = json!(caption);
                }
                if let Some(reply_to) = reply_to {
                    body["reply_to_message_id"] = json!(reply_to);
                }
                self.call(method, &body).await?
            }
        };

        Ok(SentMessage {
            message_id: message.message_id,
            file_id: message.file_id(),
        })
    }

    async fn edit_caption(
        &self,
        target: &MessageTarget,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()> {
        let mut body = target_fields(target);
        body.insert("caption".to_string(), json!(caption));
        body.insert("reply_markup".to_string(), markup(keyboard));
        self.call_edit("editMessageCaption", &Value::Object(body)).await
    }

    async fn edit_media(
        &self,
        target: &MessageTarget,
        media: InputMedia,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()> {
        let kind = media.kind();
        match media {
            InputMedia::FileId { file_id, .. } => {
                let mut body = target_fields(target);
                body.insert(
                    "media".to_string(),
                    json!({ "type": kind.as_str(), "media": file_id, "caption": caption }),
                );
                body.insert("reply_markup".to_string(), markup(keyboard));
                self.call_edit("editMessageMedia", &Value::Object(body)).await
            }
            InputMedia::Upload {
                file_name, bytes, ..
            } => {
                let media = json!({
                    "type": kind.as_str(),
                    "media": format!("attach://{}", ATTACHMENT),
                    "caption": caption,
                });
                let mut form = Form::new()
                    .text("media", media.to_string())
                    .text("reply_markup", markup(keyboard).to_string())
                    .part(ATTACHMENT, Part::bytes(bytes).file_name(file_name));
                for (name, value) in target_fields(target) {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    form = form.text(name, value);
                }
                ignore_not_modified(self.call_multipart::<Value>("editMessageMedia", form).await)
            }
        }
    }

    async fn edit_reply_markup(&self, target: &MessageTarget, keyboard: &InlineKeyboard) -> BotResult<()> {
        let mut body = target_fields(target);
        body.insert("reply_markup".to_string(), keyboard_json(keyboard));
        self.call_edit("editMessageReplyMarkup", &Value::Object(body)).await
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> BotResult<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<Value>("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn answer_inline(&self, query_id: &str, results: Vec<CachedPhotoResult>) -> BotResult<()> {
        let results: Vec<Value> = results
            .into_iter()
            .map(|result| {
                json!({
                    "type": "photo",
                    "id": result.id,
                    "photo_file_id": result.photo_file_id,
                    "caption": result.caption,
                    "reply_markup": keyboard_json(&result.keyboard),
                })
            })
            .collect();
        let body = json!({
            "inline_query_id": query_id,
            "results": results,
            "cache_time": 0,
            "is_personal": true,
        });
        self.call::<Value>("answerInlineQuery", &body).await?;
        Ok(())
    }
}
