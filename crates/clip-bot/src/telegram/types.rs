//! Bot API wire types (the subset the bot reads).

use serde::Deserialize;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    /// Sizes of a photo, smallest first
    #[serde(default)]
    pub photo: Vec<FileRef>,
}

impl Message {
    /// Stored id of the attached media; the largest size for photos.
    pub fn file_id(&self) -> Option<String> {
        self.video
            .as_ref()
            .or(self.audio.as_ref())
            .or(self.photo.last())
            .map(|file| file.file_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Short name of the update kind, for logs.
    pub fn kind(&self) -> &'static str {
        if self.message.is_some() {
            "message"
        } else if self.edited_message.is_some() {
            "edited_message"
        } else if self.inline_query.is_some() {
            "inline_query"
        } else if self.callback_query.is_some() {
            "callback_query"
        } else {
            "other"
        }
    }
}
