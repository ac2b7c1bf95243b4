//! Update handling against a recording transport.

mod common;

use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clip_bot::keyboard::{control_surface, loading};
use clip_bot::telegram::{CallbackQuery, Chat, InlineQuery, Message, User};
use clip_bot::{InputMedia, MediaKind, MessageTarget};
use clip_models::{encode, Action, ControlState, EditFocus, MediaClass, Request, StepGranularity};

use common::{harness, Call, CHANNEL_ID, CHAT_ID, OWNER_ID, UNUSED_THUMBNAILS};

const INLINE_ID: &str = "inline-1";

fn text_message(message_id: i64, text: &str) -> Message {
    Message {
        message_id,
        chat: Chat { id: CHAT_ID },
        from: Some(User {
            id: OWNER_ID,
            username: None,
        }),
        text: Some(text.to_string()),
        video: None,
        audio: None,
        photo: Vec::new(),
    }
}

fn press(actor_id: i64, data: String) -> CallbackQuery {
    CallbackQuery {
        id: "cb-1".to_string(),
        from: User {
            id: actor_id,
            username: None,
        },
        message: None,
        inline_message_id: Some(INLINE_ID.to_string()),
        data: Some(data),
    }
}

fn state(start: f64, end: f64) -> ControlState {
    ControlState::new(OWNER_ID, Request::new("dQw4w9WgXcQ", start, end))
}

fn inline_target() -> MessageTarget {
    MessageTarget::Inline(INLINE_ID.to_string())
}

fn answered(text: Option<&str>) -> Call {
    Call::AnswerCallback {
        callback_id: "cb-1".to_string(),
        text: text.map(str::to_string),
    }
}

#[tokio::test]
async fn test_message_replies_with_rendered_clip() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(
        h.ctx
            .handle_message(&text_message(5, "look https://youtu.be/dQw4w9WgXcQ 1:05 1:15"))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(
        calls,
        vec![
            Call::ChatAction {
                chat_id: CHAT_ID,
                action: clip_bot::ChatAction::UploadVideo,
            },
            Call::SendMedia {
                chat_id: CHAT_ID,
                media: InputMedia::upload(MediaKind::Video, "clip.mp4", b"best-combined:65-75.mp4".to_vec()),
                caption: Some("https://youtu.be/dQw4w9WgXcQ?t=65".to_string()),
                reply_to: Some(5),
            },
        ]
    );
    assert_eq!(h.ctx.results.lookup(&(CHAT_ID, 5)), Some(1000));
}

#[tokio::test]
async fn test_plain_link_gets_default_duration() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(h.ctx.handle_message(&text_message(5, "https://youtu.be/dQw4w9WgXcQ")).await);

    let calls = h.transport.calls();
    assert!(matches!(
        &calls[1],
        Call::SendMedia { media: InputMedia::Upload { bytes, .. }, .. }
            if bytes.as_slice() == b"best-combined:0-10.mp4"
    ));
}

#[tokio::test]
async fn test_invalid_range_is_reported_without_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(
        h.ctx
            .handle_message(&text_message(5, "https://youtu.be/dQw4w9WgXcQ 20 10"))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Call::SendText { reply_to: Some(5), .. }));
    assert!(h.resolver.calls().is_empty());
}

#[tokio::test]
async fn test_unrelated_text_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(h.ctx.handle_message(&text_message(5, "hello there")).await);
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn test_edited_message_replaces_previous_result() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(
        h.ctx
            .handle_message(&text_message(5, "https://youtu.be/dQw4w9WgXcQ 10 20"))
            .await
    );
    assert_ok!(
        h.ctx
            .handle_edited_message(&text_message(5, "https://youtu.be/dQw4w9WgXcQ 30 40"))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(
        calls.last(),
        Some(&Call::EditMedia {
            target: MessageTarget::Chat {
                chat_id: CHAT_ID,
                message_id: 1000,
            },
            media: InputMedia::upload(MediaKind::Video, "clip.mp4", b"best-combined:30-40.mp4".to_vec()),
            caption: "https://youtu.be/dQw4w9WgXcQ?t=30".to_string(),
            keyboard: None,
        })
    );
    let sends = calls
        .iter()
        .filter(|call| matches!(call, Call::SendMedia { .. }))
        .count();
    assert_eq!(sends, 1);
}

#[tokio::test]
async fn test_edited_message_without_result_sends_new_one() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(
        h.ctx
            .handle_edited_message(&text_message(8, "https://youtu.be/dQw4w9WgXcQ 30 40"))
            .await
    );

    assert!(matches!(
        h.transport.calls().last(),
        Some(Call::SendMedia { reply_to: Some(8), .. })
    ));
    assert_eq!(h.ctx.results.lookup(&(CHAT_ID, 8)), Some(1000));
}

#[tokio::test]
async fn test_press_from_another_user_edits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let data = encode(&state(10.0, 20.0).payload(Action::Render(MediaClass::Video)));

    assert_ok!(h.ctx.handle_callback(&press(OWNER_ID + 1, data)).await);

    assert_eq!(
        h.transport.calls(),
        vec![answered(Some("Only the user who requested this clip can edit it"))]
    );
    assert!(h.resolver.calls().is_empty());
}

#[tokio::test]
async fn test_undecodable_press_gets_a_notice() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);

    assert_ok!(h.ctx.handle_callback(&press(OWNER_ID, "garbage".to_string())).await);

    assert_eq!(
        h.transport.calls(),
        vec![answered(Some("This button is no longer valid"))]
    );
}

#[tokio::test]
async fn test_toggle_refreshes_keyboard_only() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let current = state(10.0, 20.0);

    assert_ok!(
        h.ctx
            .handle_callback(&press(OWNER_ID, encode(&current.payload(Action::ToggleFocus))))
            .await
    );

    let toggled = ControlState {
        focus: EditFocus::Start,
        ..current
    };
    assert_eq!(
        h.transport.calls(),
        vec![
            answered(None),
            Call::EditReplyMarkup {
                target: inline_target(),
                keyboard: control_surface(&toggled),
            },
        ]
    );
}

#[tokio::test]
async fn test_adjustment_updates_caption_and_controls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let current = state(10.0, 20.0);
    let step = StepGranularity::Whole.steps()[0];

    assert_ok!(
        h.ctx
            .handle_callback(&press(OWNER_ID, encode(&current.payload(Action::Adjust(step)))))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 2);
    match &calls[1] {
        Call::EditCaption {
            target,
            caption,
            keyboard,
        } => {
            assert_eq!(target, &inline_target());
            let expected = Request::new("dQw4w9WgXcQ", 10.0, 20.0 + step.as_secs());
            assert_eq!(caption, &expected.query_text());
            assert!(keyboard.is_some());
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_adjustment_past_zero_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let current = ControlState {
        focus: EditFocus::Start,
        ..state(0.0, 20.0)
    };
    let back = StepGranularity::Whole.steps()[0].negated();

    assert_ok!(
        h.ctx
            .handle_callback(&press(OWNER_ID, encode(&current.payload(Action::Adjust(back)))))
            .await
    );

    assert_eq!(h.transport.calls(), vec![answered(None)]);
}

#[tokio::test]
async fn test_final_render_replaces_media_and_drops_controls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let current = state(10.0, 20.0);

    assert_ok!(
        h.ctx
            .handle_callback(&press(
                OWNER_ID,
                encode(&current.payload(Action::Render(MediaClass::Audio)))
            ))
            .await
    );

    let url = current.request.start_timestamp_url();
    assert_eq!(
        h.transport.calls(),
        vec![
            answered(None),
            Call::EditCaption {
                target: inline_target(),
                caption: url.clone(),
                keyboard: Some(loading(&current.request)),
            },
            Call::SendMedia {
                chat_id: CHANNEL_ID,
                media: InputMedia::upload(MediaKind::Audio, "clip.mp3", b"best-audio:10-20.mp3".to_vec()),
                caption: None,
                reply_to: None,
            },
            Call::EditMedia {
                target: inline_target(),
                media: InputMedia::FileId {
                    kind: MediaKind::Audio,
                    file_id: "file-1000".to_string(),
                },
                caption: url,
                keyboard: None,
            },
        ]
    );
}

#[tokio::test]
async fn test_failed_upload_restores_controls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    h.transport.reject_uploads();
    let current = state(10.0, 20.0);

    assert_err!(
        h.ctx
            .handle_callback(&press(
                OWNER_ID,
                encode(&current.payload(Action::Render(MediaClass::Audio)))
            ))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[2], Call::SendMedia { chat_id: CHANNEL_ID, .. }));
    assert_eq!(
        calls[3],
        Call::EditCaption {
            target: inline_target(),
            caption: format!(
                "{}\n\nTelegram API call sendAudio failed: Bad Request: file is too big",
                current.request.query_text()
            ),
            keyboard: Some(control_surface(&current)),
        }
    );
}

#[tokio::test]
async fn test_preview_keeps_controls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let current = state(10.0, 20.0);

    assert_ok!(
        h.ctx
            .handle_callback(&press(
                OWNER_ID,
                encode(&current.payload(Action::Render(MediaClass::Preview)))
            ))
            .await
    );

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(&calls[1], Call::SendMedia { chat_id: CHANNEL_ID, .. }));
    assert_eq!(
        calls[2],
        Call::EditMedia {
            target: inline_target(),
            media: InputMedia::FileId {
                kind: MediaKind::Video,
                file_id: "file-1000".to_string(),
            },
            caption: current.request.query_text(),
            keyboard: Some(control_surface(&current)),
        }
    );
}

#[tokio::test]
async fn test_exhausted_formats_show_error_with_controls() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        vec!["best-combined", "best-combined-capped", "single-file"],
        dir.path(),
        UNUSED_THUMBNAILS,
    );
    let current = state(10.0, 20.0);

    assert_ok!(
        h.ctx
            .handle_callback(&press(
                OWNER_ID,
                encode(&current.payload(Action::Render(MediaClass::Video)))
            ))
            .await
    );

    assert_eq!(
        h.resolver.calls(),
        vec!["best-combined", "best-combined-capped", "single-file"]
    );
    let calls = h.transport.calls();
    assert_eq!(calls.len(), 3);
    match &calls[2] {
        Call::EditCaption {
            caption, keyboard, ..
        } => {
            assert!(caption.starts_with(&format!("{}\n\n", current.request.query_text())));
            assert!(caption.contains("Could not render video"));
            assert_eq!(keyboard.as_ref(), Some(&control_surface(&current)));
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert!(!calls.iter().any(|call| matches!(call, Call::EditMedia { .. })));
}

#[tokio::test]
async fn test_inline_query_offers_control_surface() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vi/dQw4w9WgXcQ/mqdefault.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8]))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let template = format!("{}/vi/{{id}}/mqdefault.jpg", server.uri());
    let h = harness(vec![], dir.path(), &template);

    let query = InlineQuery {
        id: "q-1".to_string(),
        from: User {
            id: OWNER_ID,
            username: None,
        },
        query: "https://youtu.be/dQw4w9WgXcQ 1:00".to_string(),
    };
    assert_ok!(h.ctx.handle_inline_query(&query).await);

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::SendMedia {
            chat_id: CHANNEL_ID,
            media: InputMedia::upload(MediaKind::Photo, "thumbnail.jpg", vec![0xff, 0xd8]),
            caption: None,
            reply_to: None,
        }
    );
    match &calls[1] {
        Call::AnswerInline { query_id, results } => {
            assert_eq!(query_id, "q-1");
            assert_eq!(results.len(), 1);
            let offered = &results[0];
            let expected = state(0.0, 60.0);
            assert_eq!(offered.photo_file_id, "file-1000");
            assert_eq!(offered.caption, expected.request.query_text());
            assert_eq!(offered.keyboard, control_surface(&expected));
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert!(h.resolver.calls().is_empty());
}

#[tokio::test]
async fn test_inline_query_without_link_gets_empty_answer() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![], dir.path(), UNUSED_THUMBNAILS);
    let query = InlineQuery {
        id: "q-2".to_string(),
        from: User {
            id: OWNER_ID,
            username: None,
        },
        query: "cats".to_string(),
    };

    assert_ok!(h.ctx.handle_inline_query(&query).await);
    assert_eq!(
        h.transport.calls(),
        vec![Call::AnswerInline {
            query_id: "q-2".to_string(),
            results: Vec::new(),
        }]
    );
}

#[tokio::test]
async fn test_missing_thumbnail_gets_empty_answer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let template = format!("{}/vi/{{id}}/mqdefault.jpg", server.uri());
    let h = harness(vec![], dir.path(), &template);
    let query = InlineQuery {
        id: "q-3".to_string(),
        from: User {
            id: OWNER_ID,
            username: None,
        },
        query: "https://youtu.be/dQw4w9WgXcQ 5 15".to_string(),
    };

    assert_err!(h.ctx.handle_inline_query(&query).await);
    assert_eq!(
        h.transport.calls(),
        vec![Call::AnswerInline {
            query_id: "q-3".to_string(),
            results: Vec::new(),
        }]
    );
}
