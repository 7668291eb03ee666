//! Optimistic send and end behavior of the session controller.

mod support;

use colloquy_core::{ConversationStatus, MessageId, Sender};
use colloquy_session::{EndOutcome, SendOutcome, SessionController, SessionError};
use support::{Endpoint, FakeApi};

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_provisional_message_visible_while_send_in_flight() {
    let api = FakeApi::new();
    let controller = SessionController::new(api.clone());
    controller
        .create_conversation("Chat A")
        .await
        .expect("create succeeds");

    let gate = api.gate(Endpoint::Send);
    let send = controller.send_message("hello");
    let observe = async {
        gate.entered().await;
        let view = controller.session().snapshot();
        gate.release();
        view
    };
    let (outcome, in_flight) = tokio::join!(send, observe);

    let pending = in_flight.conversation().expect("conversation active");
    assert_eq!(pending.messages.len(), 1);
    assert!(pending.messages[0].is_provisional());
    assert_eq!(pending.messages[0].content, "hello");
    assert_eq!(pending.messages[0].sender, Sender::User);
    assert!(in_flight.is_sending());

    assert_eq!(
        outcome.expect("send succeeds"),
        SendOutcome::Confirmed { message_count: 2 }
    );
    let view = controller.session().snapshot();
    assert!(!view.is_sending());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_confirmed_send_adopts_server_list() {
    let api = FakeApi::new();
    let id = api.seed("Chat A", 0, &[("hi", Sender::User), ("hello!", Sender::Assistant)]);
    let controller = SessionController::new(api.clone());
    controller.select(id).await.expect("select succeeds");

    controller
        .send_message("how are you")
        .await
        .expect("send succeeds");

    let view = controller.session().snapshot();
    let active = view.conversation().expect("conversation active");
    let stored = api.stored(id).expect("stored on server");
    assert_eq!(active.messages, stored.messages);
    assert_eq!(active.provisional_count(), 0);
    assert_eq!(active.messages.len(), 4);
    assert_eq!(active.messages[3].content, "echo: how are you");
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_failed_send_rolls_back_exactly() {
    let api = FakeApi::new();
    let id = api.seed("Chat A", 0, &[("hi", Sender::User)]);
    let controller = SessionController::new(api.clone());
    controller.select(id).await.expect("select succeeds");
    let before = controller
        .session()
        .snapshot()
        .conversation()
        .cloned()
        .expect("conversation active");

    api.fail(Endpoint::Send);
    let result = controller.send_message("how are you").await;

    assert!(matches!(
        result,
        Err(SessionError::SendFailed { id: failed, .. }) if failed == id
    ));
    let view = controller.session().snapshot();
    let after = view.conversation().expect("conversation still active");
    assert_eq!(after, &before);
    assert_eq!(after.messages.len(), 1);
    assert_eq!(after.messages[0].id, MessageId::Remote(1));
    assert!(!view.is_sending());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_blank_or_inactive_send_is_noop() {
    let api = FakeApi::new();
    let controller = SessionController::new(api.clone());

    let nothing_active = controller.send_message("hello").await;
    assert_eq!(nothing_active.expect("no-op"), SendOutcome::Skipped);

    controller
        .create_conversation("Chat A")
        .await
        .expect("create succeeds");
    let blank = controller.send_message("   \n\t").await;
    assert_eq!(blank.expect("no-op"), SendOutcome::Skipped);

    assert_eq!(api.calls(Endpoint::Send), 0);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_sends_on_one_conversation_are_serialized() {
    let api = FakeApi::new();
    let controller = SessionController::new(api.clone());
    let created = controller
        .create_conversation("Chat A")
        .await
        .expect("create succeeds");

    let gate = api.gate(Endpoint::Send);
    let first = controller.send_message("one");
    let second = controller.send_message("two");
    let observe = async {
        gate.entered().await;
        // Let the second send run up to its lane.
        tokio::task::yield_now().await;
        let view = controller.session().snapshot();
        gate.release();
        view
    };
    let (first, second, in_flight) = tokio::join!(first, second, observe);

    first.expect("first send succeeds");
    second.expect("second send succeeds");
    assert_eq!(api.max_sends_in_flight(), 1);
    assert_eq!(
        in_flight
            .conversation()
            .map(colloquy_core::Conversation::provisional_count),
        Some(1)
    );

    let view = controller.session().snapshot();
    let active = view.conversation().expect("conversation active");
    let contents: Vec<_> = active.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "echo: one", "two", "echo: two"]);
    assert_eq!(
        api.stored(created.id).map(|c| c.messages),
        Some(active.messages.clone())
    );
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_send_response_for_inactive_conversation_is_dropped() {
    let api = FakeApi::new();
    let first = api.seed("First", 0, &[]);
    let second = api.seed("Second", 10, &[("untouched", Sender::User)]);
    let controller = SessionController::new(api.clone());
    controller.select(first).await.expect("select succeeds");

    let gate = api.gate(Endpoint::Send);
    let send = controller.send_message("late");
    let switch = async {
        gate.entered().await;
        let selected = controller.select(second).await;
        gate.release();
        selected
    };
    let (outcome, selected) = tokio::join!(send, switch);

    selected.expect("switch succeeds");
    assert_eq!(outcome.expect("server accepted"), SendOutcome::Detached);

    let view = controller.session().snapshot();
    let active = view.conversation().expect("conversation active");
    assert_eq!(active.id, second);
    let contents: Vec<_> = active.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["untouched"]);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_failed_send_for_inactive_conversation_leaves_new_session_alone() {
    let api = FakeApi::new();
    let first = api.seed("First", 0, &[]);
    let second = api.seed("Second", 10, &[("untouched", Sender::User)]);
    let controller = SessionController::new(api.clone());
    controller.select(first).await.expect("select succeeds");
    api.fail(Endpoint::Send);

    let gate = api.gate(Endpoint::Send);
    let send = controller.send_message("late");
    let switch = async {
        gate.entered().await;
        let selected = controller.select(second).await;
        gate.release();
        selected
    };
    let (outcome, selected) = tokio::join!(send, switch);

    selected.expect("switch succeeds");
    assert!(matches!(outcome, Err(SessionError::SendFailed { .. })));
    let view = controller.session().snapshot();
    assert_eq!(view.active_id(), Some(second));
    assert_eq!(view.conversation().map(|c| c.messages.len()), Some(1));
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_end_shows_optimistic_state_then_summary() {
    let api = FakeApi::new();
    api.set_summary(Some("Discussed pricing."));
    let id = api.seed("Pricing", 0, &[("what does it cost?", Sender::User)]);
    let controller = SessionController::new(api.clone());
    controller.refresh().await.expect("refresh succeeds");

    let gate = api.gate(Endpoint::End);
    let end = controller.end_conversation(|_| true);
    let observe = async {
        gate.entered().await;
        let view = controller.session().snapshot();
        let entry = controller.catalog().get(id);
        gate.release();
        (view, entry)
    };
    let (outcome, (in_flight, entry)) = tokio::join!(end, observe);

    let pending = in_flight.conversation().expect("conversation active");
    assert_eq!(pending.status, ConversationStatus::Ended);
    assert_eq!(pending.summary, None);
    assert!(in_flight.is_generating_summary());
    assert_eq!(entry.map(|e| e.status), Some(ConversationStatus::Ended));

    assert_eq!(
        outcome.expect("end succeeds"),
        EndOutcome::Ended {
            summary: Some("Discussed pricing.".to_string())
        }
    );
    let view = controller.session().snapshot();
    let ended = view.conversation().expect("conversation active");
    assert_eq!(ended.status, ConversationStatus::Ended);
    assert_eq!(ended.summary.as_deref(), Some("Discussed pricing."));
    assert!(!view.is_generating_summary());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_end_without_server_summary() {
    let api = FakeApi::new();
    api.set_summary(None);
    let id = api.seed("Quiet", 0, &[]);
    let controller = SessionController::new(api.clone());
    controller.select(id).await.expect("select succeeds");

    let outcome = controller.end_conversation(|_| true).await;

    assert_eq!(
        outcome.expect("end succeeds"),
        EndOutcome::Ended { summary: None }
    );
    let view = controller.session().snapshot();
    assert_eq!(
        view.conversation().map(|c| c.status),
        Some(ConversationStatus::Ended)
    );
    assert!(!view.is_generating_summary());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_failed_end_keeps_local_ended_status() {
    let api = FakeApi::new();
    let id = api.seed("Pricing", 0, &[]);
    let controller = SessionController::new(api.clone());
    controller.refresh().await.expect("refresh succeeds");
    api.fail(Endpoint::End);

    let result = controller.end_conversation(|_| true).await;

    assert!(matches!(
        result,
        Err(SessionError::EndFailed { id: failed, .. }) if failed == id
    ));
    let view = controller.session().snapshot();
    let local = view.conversation().expect("conversation active");
    assert_eq!(local.status, ConversationStatus::Ended);
    assert_eq!(local.summary, None);
    assert!(!view.is_generating_summary());
    assert_eq!(
        controller.catalog().get(id).map(|e| e.status),
        Some(ConversationStatus::Ended)
    );

    // Ended locally, so further sends are no-ops.
    let send = controller.send_message("still there?").await;
    assert_eq!(send.expect("no-op"), SendOutcome::Skipped);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_end_requires_confirmation_and_active_status() {
    let api = FakeApi::new();
    let controller = SessionController::new(api.clone());

    let nothing = controller.end_conversation(|_| true).await;
    assert_eq!(nothing.expect("no-op"), EndOutcome::Skipped);

    controller
        .create_conversation("Chat A")
        .await
        .expect("create succeeds");

    let mut asked_about = None;
    let declined = controller
        .end_conversation(|c| {
            asked_about = Some(c.title.clone());
            false
        })
        .await;
    assert_eq!(declined.expect("declined"), EndOutcome::Declined);
    assert_eq!(asked_about.as_deref(), Some("Chat A"));
    assert_eq!(
        controller
            .session()
            .snapshot()
            .conversation()
            .map(|c| c.status),
        Some(ConversationStatus::Active)
    );

    controller
        .end_conversation(|_| true)
        .await
        .expect("end succeeds");
    let again = controller.end_conversation(|_| true).await;
    assert_eq!(again.expect("no-op"), EndOutcome::Skipped);
    assert_eq!(api.calls(Endpoint::End), 1);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_end_shows_ended_while_send_in_flight() {
    let api = FakeApi::new();
    api.set_summary(Some("Short chat."));
    let controller = SessionController::new(api.clone());
    let created = controller
        .create_conversation("Chat A")
        .await
        .expect("create succeeds");

    let gate = api.gate(Endpoint::Send);
    let send = controller.send_message("last words");
    let end = async {
        gate.entered().await;
        let ending = controller.end_conversation(|_| true);
        let release = async {
            tokio::task::yield_now().await;
            // The end request waits for the send, the local state does not.
            let view = controller.session().snapshot();
            let end_calls = api.calls(Endpoint::End);
            gate.release();
            (view, end_calls)
        };
        tokio::join!(ending, release)
    };
    let (sent, (ended, (while_sending, end_calls))) = tokio::join!(send, end);

    let pending = while_sending.conversation().expect("conversation active");
    assert_eq!(pending.status, ConversationStatus::Ended);
    assert_eq!(pending.summary, None);
    assert!(while_sending.is_generating_summary());
    assert!(while_sending.is_sending());
    assert_eq!(end_calls, 0);

    assert_eq!(
        sent.expect("send succeeds"),
        SendOutcome::Confirmed { message_count: 2 }
    );
    ended.expect("end succeeds");

    let view = controller.session().snapshot();
    let active = view.conversation().expect("conversation active");
    assert_eq!(active.status, ConversationStatus::Ended);
    assert_eq!(active.summary.as_deref(), Some("Short chat."));
    assert!(!view.is_generating_summary());
    assert_eq!(
        api.stored(created.id).map(|c| c.messages.len()),
        Some(active.messages.len())
    );
}
