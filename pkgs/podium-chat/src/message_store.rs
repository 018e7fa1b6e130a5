//! Message store - in-memory message history keyed by conversation

use crate::error::{ChatError, Result};
use crate::events::{Message, Participant};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Message store - append-only history per conversation
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<String, Vec<Message>>,
    sequence: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of a conversation, oldest first.
    ///
    /// Equal timestamps keep their append order.
    pub fn list_messages(&self, conversation_id: &str) -> Vec<Message> {
        let mut messages = self
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by_key(|m| m.timestamp);
        messages
    }

    pub fn count(&self, conversation_id: &str) -> usize {
        self.messages.get(conversation_id).map_or(0, Vec::len)
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages
            .values()
            .flat_map(|msgs| msgs.iter())
            .find(|m| m.id == message_id)
    }

    /// Append a new message. Blank content is rejected without touching state.
    pub fn append_message(
        &mut self,
        conversation_id: &str,
        sender: &Participant,
        content: &str,
        timestamp: DateTime<Utc>,
        is_read: bool,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content is empty".to_string(),
            ));
        }

        let message = Message {
            id: self.next_id(timestamp),
            conversation_id: conversation_id.to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            content: content.to_string(),
            timestamp,
            is_read,
        };

        debug!(
            "Appending message {} from {} to {}",
            message.id, message.sender_id, conversation_id
        );

        self.messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());

        Ok(message)
    }

    /// Mark every message not sent by `reader_id` as read.
    ///
    /// Returns how many messages changed state.
    pub fn mark_conversation_read(&mut self, conversation_id: &str, reader_id: &str) -> usize {
        let Some(messages) = self.messages.get_mut(conversation_id) else {
            return 0;
        };

        let mut changed = 0;
        for message in messages
            .iter_mut()
            .filter(|m| !m.is_read && m.sender_id != reader_id)
        {
            message.is_read = true;
            changed += 1;
        }
        changed
    }

    /// Number of messages not sent by `reader_id` that are still unread
    pub fn unread_incoming(&self, conversation_id: &str, reader_id: &str) -> usize {
        self.messages.get(conversation_id).map_or(0, |msgs| {
            msgs.iter()
                .filter(|m| !m.is_read && m.sender_id != reader_id)
                .count()
        })
    }

    fn next_id(&mut self, timestamp: DateTime<Utc>) -> String {
        self.sequence += 1;
        format!("msg-{}-{}", timestamp.timestamp_millis(), self.sequence)
    }
}
