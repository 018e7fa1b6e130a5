// Copyright 2024 Podium Team.
//
// Tests for ChatService: selection, appends and the unread invariant

use chrono::{Duration, TimeZone, Utc};
use podium_chat::{
    ChatConfig, ChatEvent, ChatService, FixedRandom, ManualClock, Participant, SeedData,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const ME: &str = "user-123";

fn create_test_service(
    probability: f64,
) -> (ChatService, UnboundedReceiver<ChatEvent>, Arc<ManualClock>) {
    let config = ChatConfig {
        reply_probability: probability,
        reply_delay_ms: 0,
        ..Default::default()
    };
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ));
    let seed = SeedData::speaker_portal(&config.current_user).unwrap();
    let (service, events) =
        ChatService::with_parts(config, seed, clock.clone(), Box::new(FixedRandom(0.0))).unwrap();
    (service, events, clock)
}

fn drain(events: &mut UnboundedReceiver<ChatEvent>) -> Vec<ChatEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn unread_matches_history(service: &ChatService, conversation_id: &str) -> bool {
    let conversation = service.conversation(conversation_id).unwrap();
    let unread = service
        .list_messages(conversation_id)
        .unwrap()
        .iter()
        .filter(|m| !m.is_read && m.sender_id != ME)
        .count();
    conversation.unread_count as usize == unread
}

#[test]
fn test_seeded_conversations_keep_insertion_order() {
    let (service, _events, _clock) = create_test_service(0.0);

    let ids: Vec<_> = service
        .list_conversations()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["conv-1", "conv-2", "conv-3"]);

    let unread: Vec<_> = service
        .list_conversations()
        .into_iter()
        .map(|c| c.unread_count)
        .collect();
    assert_eq!(unread, vec![2, 0, 5]);

    for id in ["conv-1", "conv-2", "conv-3"] {
        assert!(unread_matches_history(&service, id));
    }
    assert_eq!(service.active_conversation_id(), None);
}

#[test]
fn test_select_resets_unread() {
    let (service, mut events, _clock) = create_test_service(0.0);

    service.select_conversation("conv-1").unwrap();

    let conversation = service.conversation("conv-1").unwrap();
    assert_eq!(conversation.unread_count, 0);
    assert_eq!(service.active_conversation_id().as_deref(), Some("conv-1"));
    assert!(unread_matches_history(&service, "conv-1"));

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        ChatEvent::ConversationSelected { conversation_id } if conversation_id == "conv-1"
    )));
}

#[test]
fn test_select_every_conversation() {
    let (service, _events, _clock) = create_test_service(0.0);

    for conversation in service.list_conversations() {
        service.select_conversation(&conversation.id).unwrap();
        assert_eq!(service.conversation(&conversation.id).unwrap().unread_count, 0);
        assert_eq!(
            service.active_conversation_id(),
            Some(conversation.id.clone())
        );
    }
}

#[test]
fn test_select_unknown_conversation_is_not_found() {
    let (service, _events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-2").unwrap();

    let err = service.select_conversation("conv-404").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(service.active_conversation_id().as_deref(), Some("conv-2"));
    assert_eq!(service.conversation("conv-1").unwrap().unread_count, 2);
}

#[test]
fn test_append_grows_history_by_one() {
    let (service, mut events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-1").unwrap();
    drain(&mut events);

    let before = service.list_messages("conv-1").unwrap().len();
    let message = service.append_message("conv-1", ME, "hello").unwrap();
    let after = service.list_messages("conv-1").unwrap();

    assert_eq!(after.len(), before + 1);
    assert_eq!(message.content, "hello");
    assert!(!message.is_read);
    assert_eq!(after.last().unwrap().id, message.id);
    assert_eq!(
        service.conversation("conv-1").unwrap().last_message.unwrap().id,
        message.id
    );

    let events = drain(&mut events);
    assert!(matches!(
        events.as_slice(),
        [ChatEvent::MessageAppended { message: m }] if m.content == "hello"
    ));
}

#[test]
fn test_blank_content_is_rejected_without_mutation() {
    let (service, _events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-1").unwrap();
    let before = service.list_messages("conv-1").unwrap();

    for content in ["", "   ", "\n\t"] {
        let err = service.append_message("conv-1", ME, content).unwrap_err();
        assert!(err.is_validation());
    }

    assert_eq!(service.list_messages("conv-1").unwrap(), before);
}

#[test]
fn test_send_without_active_conversation_fails() {
    let (service, _events, _clock) = create_test_service(0.0);

    let err = service.append_message("conv-1", ME, "hello").unwrap_err();
    assert!(err.is_validation());
    let err = service.send_message("hello").unwrap_err();
    assert!(err.is_validation());

    service.select_conversation("conv-2").unwrap();
    let err = service.append_message("conv-1", ME, "hello").unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.list_messages("conv-1").unwrap().len(), 4);
}

#[test]
fn test_append_to_unknown_conversation() {
    let (service, _events, _clock) = create_test_service(0.0);
    let err = service.append_message("conv-404", ME, "hello").unwrap_err();
    assert!(err.is_not_found());
    assert!(service.list_messages("conv-404").unwrap_err().is_not_found());
}

#[test]
fn test_append_from_stranger_is_rejected() {
    let (service, _events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-1").unwrap();

    let err = service
        .append_message("conv-1", "user-789", "not my thread")
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_incoming_message_to_background_conversation_counts_unread() {
    let (service, mut events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-1").unwrap();
    drain(&mut events);

    let message = service
        .append_message("conv-2", "user-789", "Are you around?")
        .unwrap();
    assert!(!message.is_read);
    assert_eq!(service.conversation("conv-2").unwrap().unread_count, 1);

    service
        .append_message("conv-2", "user-789", "Ping")
        .unwrap();
    assert_eq!(service.conversation("conv-2").unwrap().unread_count, 2);
    assert!(unread_matches_history(&service, "conv-2"));

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        ChatEvent::UnreadChanged { conversation_id, unread_count: 2 } if conversation_id == "conv-2"
    )));

    service.select_conversation("conv-2").unwrap();
    assert_eq!(service.conversation("conv-2").unwrap().unread_count, 0);
    assert!(unread_matches_history(&service, "conv-2"));
}

#[test]
fn test_incoming_message_to_active_conversation_is_not_counted() {
    let (service, mut events, _clock) = create_test_service(0.0);
    service.select_conversation("conv-1").unwrap();
    drain(&mut events);

    let message = service
        .append_message("conv-1", "user-456", "Sounds good")
        .unwrap();
    assert!(!message.is_read);
    assert_eq!(service.conversation("conv-1").unwrap().unread_count, 0);
    assert!(!drain(&mut events)
        .iter()
        .any(|e| matches!(e, ChatEvent::UnreadChanged { .. })));

    // the next selection brings the history back in step
    service.select_conversation("conv-1").unwrap();
    let stored = service
        .list_messages("conv-1")
        .unwrap()
        .into_iter()
        .find(|m| m.id == message.id)
        .unwrap();
    assert!(stored.is_read);
    assert!(unread_matches_history(&service, "conv-1"));
}

#[test]
fn test_blank_incoming_message_leaves_unread_alone() {
    let (service, _events, _clock) = create_test_service(0.0);
    let before = service.list_messages("conv-2").unwrap();

    let err = service
        .append_message("conv-2", "user-789", "  ")
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.conversation("conv-2").unwrap().unread_count, 0);
    assert_eq!(service.list_messages("conv-2").unwrap(), before);
}

#[test]
fn test_list_messages_is_idempotent_and_ordered() {
    let (service, _events, clock) = create_test_service(0.0);
    service.select_conversation("conv-3").unwrap();
    clock.advance(Duration::seconds(5));
    service.append_message("conv-3", ME, "Thanks all").unwrap();

    let first = service.list_messages("conv-3").unwrap();
    let second = service.list_messages("conv-3").unwrap();
    assert_eq!(first, second);

    for pair in first.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(first.last().unwrap().content, "Thanks all");
}

#[test]
fn test_recency_order_follows_latest_message() {
    let (service, _events, clock) = create_test_service(0.0);

    let ids: Vec<_> = service
        .list_conversations_by_recency()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["conv-1", "conv-3", "conv-2"]);

    clock.advance(Duration::minutes(1));
    service.select_conversation("conv-2").unwrap();
    service.append_message("conv-2", ME, "Back again").unwrap();

    let first = service.list_conversations_by_recency().remove(0);
    assert_eq!(first.id, "conv-2");
    // insertion order is untouched
    assert_eq!(service.list_conversations()[0].id, "conv-1");
}

#[test]
fn test_start_conversation_adds_current_user() {
    let (service, _events, _clock) = create_test_service(0.0);

    let conversation = service
        .start_conversation(vec![Participant::new("user-900", "Priya Patel")])
        .unwrap();

    assert!(conversation.id.starts_with("conv-"));
    assert_eq!(conversation.participants[0].id, ME);
    assert_eq!(conversation.display_name(ME), "Priya Patel");
    assert_eq!(service.list_conversations().last().unwrap().id, conversation.id);
    assert!(service.list_messages(&conversation.id).unwrap().is_empty());

    let err = service.start_conversation(Vec::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_invalid_probability_is_rejected() {
    let config = ChatConfig {
        reply_probability: 1.5,
        ..Default::default()
    };
    assert!(ChatService::new(config).is_err());
}
