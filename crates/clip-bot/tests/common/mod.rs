//! Shared fakes for handler tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clip_bot::{
    BotContext, BotError, BotResult, CachedPhotoResult, ChatAction, InlineKeyboard, InputMedia,
    MessageTarget, RecentResultCache, RenderWorker, SentMessage, ThumbnailFetcher, Transport,
};
use clip_media::{ClipOrchestrator, MediaError, MediaResult, SourceLocator, SourceResolver, Transcoder};
use clip_models::{CandidateFormat, FormatTable, OutputTarget};

pub const CHANNEL_ID: i64 = -100_500;
pub const CHAT_ID: i64 = 42;
pub const OWNER_ID: i64 = 7;

/// One outgoing transport operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendText {
        chat_id: i64,
        text: String,
        reply_to: Option<i64>,
    },
    ChatAction {
        chat_id: i64,
        action: ChatAction,
    },
    SendMedia {
        chat_id: i64,
        media: InputMedia,
        caption: Option<String>,
        reply_to: Option<i64>,
    },
    EditCaption {
        target: MessageTarget,
        caption: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditMedia {
        target: MessageTarget,
        media: InputMedia,
        caption: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditReplyMarkup {
        target: MessageTarget,
        keyboard: InlineKeyboard,
    },
    AnswerCallback {
        callback_id: String,
        text: Option<String>,
    },
    AnswerInline {
        query_id: String,
        results: Vec<CachedPhotoResult>,
    },
}

/// Transport that records every call and assigns increasing message ids.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    uploads_rejected: AtomicBool,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every later `send_media` fail after being recorded.
    pub fn reject_uploads(&self) {
        self.uploads_rejected.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_message(&self, media: Option<&InputMedia>) -> SentMessage {
        let message_id = 1000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        SentMessage {
            message_id,
            file_id: media.map(|_| format!("file-{}", message_id)),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> BotResult<SentMessage> {
        self.record(Call::SendText {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        Ok(self.next_message(None))
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> BotResult<()> {
        self.record(Call::ChatAction { chat_id, action });
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media: InputMedia,
        caption: Option<&str>,
        reply_to: Option<i64>,
    ) -> BotResult<SentMessage> {
        let sent = self.next_message(Some(&media));
        self.record(Call::SendMedia {
            chat_id,
            media,
            caption: caption.map(str::to_string),
            reply_to,
        });
        if self.uploads_rejected.load(Ordering::SeqCst) {
            return Err(BotError::api("sendAudio", "Bad Request: file is too big"));
        }
        Ok(sent)
    }

    async fn edit_caption(
        &self,
        target: &MessageTarget,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()> {
        self.record(Call::EditCaption {
            target: target.clone(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_media(
        &self,
        target: &MessageTarget,
        media: InputMedia,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> BotResult<()> {
        self.record(Call::EditMedia {
            target: target.clone(),
            media,
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_reply_markup(&self, target: &MessageTarget, keyboard: &InlineKeyboard) -> BotResult<()> {
        self.record(Call::EditReplyMarkup {
            target: target.clone(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> BotResult<()> {
        self.record(Call::AnswerCallback {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn answer_inline(&self, query_id: &str, results: Vec<CachedPhotoResult>) -> BotResult<()> {
        self.record(Call::AnswerInline {
            query_id: query_id.to_string(),
            results,
        });
        Ok(())
    }
}

/// Resolver that fails every format listed in `unavailable`.
pub struct ScriptedResolver {
    unavailable: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new(unavailable: Vec<&'static str>) -> Self {
        Self {
            unavailable,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceResolver for ScriptedResolver {
    async fn resolve(&self, _source_id: &str, format: &CandidateFormat) -> MediaResult<SourceLocator> {
        self.calls.lock().unwrap().push(format.name.clone());
        if self.unavailable.contains(&format.name.as_str()) {
            return Err(MediaError::format_unavailable(
                &format.name,
                "Requested format is not available",
            ));
        }
        Ok(SourceLocator {
            format: format.name.clone(),
            urls: vec![format!("https://streams/{}", format.name)],
            http_headers: Vec::new(),
        })
    }
}

/// Transcoder whose output names the format, range and container.
pub struct EchoTranscoder;

#[async_trait]
impl Transcoder for EchoTranscoder {
    async fn extract_and_encode(
        &self,
        locator: &SourceLocator,
        start: f64,
        end: f64,
        target: &OutputTarget,
        _work_dir: &Path,
    ) -> MediaResult<Vec<u8>> {
        Ok(format!("{}:{}-{}.{}", locator.format, start, end, target.container).into_bytes())
    }
}

pub struct Harness {
    pub ctx: BotContext,
    pub transport: Arc<RecordingTransport>,
    pub resolver: Arc<ScriptedResolver>,
}

/// Context over fakes; thumbnails come from `thumbnail_template`.
pub fn harness(unavailable: Vec<&'static str>, work_dir: &Path, thumbnail_template: &str) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let resolver = Arc::new(ScriptedResolver::new(unavailable));
    let orchestrator = ClipOrchestrator::new(
        resolver.clone(),
        Arc::new(EchoTranscoder),
        FormatTable::default(),
        work_dir,
    );
    let ctx = BotContext {
        transport: transport.clone(),
        worker: RenderWorker::new(orchestrator, 2),
        results: RecentResultCache::new(16, Duration::from_secs(3600)),
        thumbnails: ThumbnailFetcher::new(thumbnail_template, Duration::from_secs(2)).unwrap(),
        channel_id: CHANNEL_ID,
        default_duration_secs: 10.0,
    };
    Harness {
        ctx,
        transport,
        resolver,
    }
}

/// Thumbnail template pointing nowhere, for tests that never fetch one.
pub const UNUSED_THUMBNAILS: &str = "http://127.0.0.1:9/vi/{id}/mqdefault.jpg";
