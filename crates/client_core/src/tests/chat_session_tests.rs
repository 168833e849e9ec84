use std::{sync::atomic::Ordering, time::Duration};

use shared::domain::ChatRole;
use tokio::time;

use super::*;
use crate::test_support::{unreachable, ScriptedService};

fn controller_with(service: ScriptedService) -> (ChatSessionController, Arc<ScriptedService>) {
    let service = Arc::new(service);
    (ChatSessionController::new(service.clone()), service)
}

#[tokio::test]
async fn blank_input_is_ignored_without_transition() {
    let (chat, service) = controller_with(ScriptedService::new());

    assert_eq!(chat.send("").await, SendOutcome::Ignored);
    assert_eq!(chat.send("   ").await, SendOutcome::Ignored);
    assert_eq!(chat.send("\n\t").await, SendOutcome::Ignored);

    assert!(chat.transcript().is_empty());
    assert_eq!(chat.state(), ChatState::Idle);
    assert_eq!(service.chat_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_turn_appends_user_then_assistant() {
    let (chat, _service) = controller_with(
        ScriptedService::new().chat_after(0, Ok("Demould time is the time until stripping.".into())),
    );

    let outcome = chat.send("what is demould time?").await;

    assert_eq!(outcome, SendOutcome::Replied);
    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0], ChatMessage::user("what is demould time?"));
    assert_eq!(transcript[1].role, ChatRole::Assistant);
    assert_eq!(
        transcript[1].content,
        "Demould time is the time until stripping."
    );
    assert_eq!(chat.state(), ChatState::Idle);
}

#[tokio::test]
async fn failed_turn_appends_fallback_reply() {
    let (chat, _service) =
        controller_with(ScriptedService::new().chat_after(0, Err(unreachable("chat"))));

    let outcome = chat.send("hello").await;

    assert_eq!(outcome, SendOutcome::Recovered);
    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0], ChatMessage::user("hello"));
    assert_eq!(transcript[1], ChatMessage::assistant(CHAT_FALLBACK_REPLY));
    assert_eq!(chat.state(), ChatState::Idle);
}

#[tokio::test]
async fn every_turn_resends_full_history() {
    let (chat, service) = controller_with(
        ScriptedService::new()
            .chat_after(0, Ok("first answer".into()))
            .chat_after(0, Err(unreachable("chat")))
            .chat_after(0, Ok("third answer".into())),
    );

    chat.send("one").await;
    chat.send("two").await;
    chat.send("three").await;

    let requests = service.chat_requests.lock().await;
    let sizes: Vec<usize> = requests.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1, 3, 5]);
    assert_eq!(requests[2][1], ChatMessage::assistant("first answer"));
    assert_eq!(requests[2][3], ChatMessage::assistant(CHAT_FALLBACK_REPLY));
    assert_eq!(requests[2][4], ChatMessage::user("three"));
    assert_eq!(chat.transcript().len(), 6);
}

#[tokio::test]
async fn user_text_is_trimmed_before_sending() {
    let (chat, service) = controller_with(ScriptedService::new().chat_after(0, Ok("ok".into())));

    chat.send("  ramp rate?  ").await;

    assert_eq!(chat.transcript()[0].content, "ramp rate?");
    assert_eq!(service.chat_requests.lock().await[0][0].content, "ramp rate?");
}

#[tokio::test(start_paused = true)]
async fn awaiting_reply_holds_exactly_one_new_message_and_rejects_sends() {
    let (chat, service) = controller_with(ScriptedService::new().chat_after(500, Ok("later".into())));

    let observer = async {
        time::sleep(Duration::from_millis(100)).await;
        let snapshot = chat.snapshot();
        assert_eq!(snapshot.state, ChatState::AwaitingReply);
        assert_eq!(snapshot.transcript.len(), 1);

        assert_eq!(chat.send("second question").await, SendOutcome::Busy);
        assert_eq!(chat.transcript().len(), 1);
        assert!(!chat.clear());
    };
    let (outcome, ()) = tokio::join!(chat.send("first question"), observer);

    assert_eq!(outcome, SendOutcome::Replied);
    assert_eq!(chat.transcript().len(), 2);
    assert_eq!(service.chat_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_send_recovers_session() {
    let (chat, service) = controller_with(
        ScriptedService::new()
            .chat_after(5_000, Ok("too late".into()))
            .chat_after(0, Ok("second answer".into())),
    );

    let timed_out = time::timeout(Duration::from_millis(100), chat.send("first")).await;
    assert!(timed_out.is_err());

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0], ChatMessage::user("first"));
    assert_eq!(transcript[1], ChatMessage::assistant(CHAT_FALLBACK_REPLY));
    assert_eq!(chat.state(), ChatState::Idle);

    assert_eq!(chat.send("second").await, SendOutcome::Replied);
    assert_eq!(chat.transcript().len(), 4);
    assert_eq!(service.chat_calls.load(Ordering::SeqCst), 2);
    assert!(chat.clear());
}

#[tokio::test]
async fn clear_starts_a_new_conversation() {
    let (chat, _service) = controller_with(ScriptedService::new().chat_after(0, Ok("hi".into())));
    chat.send("hello").await;

    assert!(chat.clear());
    assert!(chat.transcript().is_empty());
    assert!(chat.snapshot().last_reply().is_none());
}

#[tokio::test]
async fn last_reply_is_latest_assistant_turn() {
    let (chat, _service) = controller_with(ScriptedService::new().chat_after(0, Ok("answer".into())));
    chat.send("question").await;

    let snapshot = chat.snapshot();
    assert_eq!(
        snapshot.last_reply().map(|message| message.content.as_str()),
        Some("answer")
    );
}
