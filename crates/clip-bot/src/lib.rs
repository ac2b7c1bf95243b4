//! Telegram clip bot.
//!
//! This crate provides:
//! - Long-polling update dispatch
//! - Handlers for messages, edits, inline queries and control presses
//! - A bounded render worker pool
//! - A recent-result cache for edit-in-place

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod keyboard;
pub mod logging;
pub mod telegram;
pub mod thumbnail;
pub mod transport;
pub mod worker;

pub use cache::{Clock, ManualClock, RecentResultCache, SystemClock};
pub use config::BotConfig;
pub use dispatcher::Dispatcher;
pub use error::{BotError, BotResult};
pub use handlers::{BotContext, ResultKey};
pub use telegram::TelegramClient;
pub use thumbnail::ThumbnailFetcher;
pub use transport::{
    CachedPhotoResult, ChatAction, InlineButton, InlineKeyboard, InputMedia, MediaKind,
    MessageTarget, SentMessage, Transport,
};
pub use worker::RenderWorker;
