//! Messaging transport boundary.
//!
//! Handlers only talk to the chat service through [`Transport`], so they can
//! be exercised against a recording fake.

use async_trait::async_trait;

use crate::error::BotResult;

/// A message that can be edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    /// Message in a chat
    Chat { chat_id: i64, message_id: i64 },
    /// Message sent through inline mode
    Inline(String),
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Photo,
}

impl MediaKind {
    /// Field name used by the Bot API for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Photo => "photo",
        }
    }
}

/// Media to attach to a message.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMedia {
    /// Fresh upload
    Upload {
        kind: MediaKind,
        file_name: String,
        bytes: Vec<u8>,
    },
    /// Media already stored by the transport
    FileId { kind: MediaKind, file_id: String },
}

impl InputMedia {
    pub fn upload(kind: MediaKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Upload {
            kind,
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            InputMedia::Upload { kind, .. } | InputMedia::FileId { kind, .. } => *kind,
        }
    }
}

/// Button of an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineButton {
    /// Sends the payload back as a callback
    Callback { text: String, data: String },
    /// Opens a link
    Url { text: String, url: String },
}

impl InlineButton {
    pub fn text(&self) -> &str {
        match self {
            InlineButton::Callback { text, .. } | InlineButton::Url { text, .. } => text,
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// All callback payloads, row by row.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().filter_map(|button| match button {
            InlineButton::Callback { data, .. } => Some(data.as_str()),
            InlineButton::Url { .. } => None,
        })
    }
}

/// Chat action shown while the bot works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    UploadVideo,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::UploadVideo => "upload_video",
        }
    }
}

/// Result offered to an inline query.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPhotoResult {
    pub id: String,
    pub photo_file_id: String,
    pub caption: String,
    pub keyboard: InlineKeyboard,
}

/// A message the transport accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
    /// Stored id of the attached media, if any
    pub file_id: Option<String>,
}

/// Outgoing operations of the messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> BotResult<SentMessage>;

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> BotResult<()>;

    /// Upload media to a chat.
    async fn send_media(
        &self,
        chat_id: i64,
        media: InputMedia,
        caption: Option<&str>,
        reply_to: Option<i64>,
    ) -> BotResult<SentMessage>;

    /// Replace the caption; the keyboard is removed when `keyboard` is `None`.
    async fn edit_caption(
        &self,
        target: &MessageTarget,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()>;

    /// Replace the attached media; the keyboard is removed when `keyboard` is `None`.
    async fn edit_media(
        &self,
        target: &MessageTarget,
        media: InputMedia,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()>;

    async fn edit_reply_markup(&self, target: &MessageTarget, keyboard: &InlineKeyboard) -> BotResult<()>;

    /// Acknowledge a button press, optionally with a notice for the user.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> BotResult<()>;

    async fn answer_inline(&self, query_id: &str, results: Vec<CachedPhotoResult>) -> BotResult<()>;
}
