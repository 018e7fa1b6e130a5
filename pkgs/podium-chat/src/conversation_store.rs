//! Conversation store - ordered conversations, active selection and unread counters

use crate::error::{ChatError, Result};
use crate::events::{Conversation, Message};
use tracing::{debug, info};

/// Conversation store
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversation at the end of the list
    pub fn insert(&mut self, conversation: Conversation) -> Result<()> {
        if self.contains(&conversation.id) {
            return Err(ChatError::Validation(format!(
                "conversation '{}' already exists",
                conversation.id
            )));
        }

        debug!(
            "Adding conversation {} with {} participants",
            conversation.id,
            conversation.participants.len()
        );
        self.conversations.push(conversation);
        Ok(())
    }

    /// All conversations in insertion order
    pub fn list_conversations(&self) -> Vec<Conversation> {
        self.conversations.clone()
    }

    /// Conversations with the most recent activity first.
    ///
    /// Conversations without any message go last; ties keep insertion order.
    pub fn list_by_recency(&self) -> Vec<Conversation> {
        let mut sorted = self.conversations.clone();
        sorted.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::conversation_not_found(id))
    }

    /// Make a conversation active and reset its unread counter.
    ///
    /// Returns the previously active conversation id. Unknown ids leave the
    /// selection untouched.
    pub fn select_conversation(&mut self, id: &str) -> Result<Option<String>> {
        let conversation = self.get_mut(id)?;
        conversation.unread_count = 0;

        let previous = self.active.replace(id.to_string());
        info!("Selected conversation {}", id);
        Ok(previous)
    }

    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }

    /// Leave no conversation active, returning the one that was
    pub fn clear_selection(&mut self) -> Option<String> {
        self.active.take()
    }

    /// Track a newly appended message: update the preview and, for an
    /// unread incoming message, bump the counter. Returns the unread count.
    pub fn record_message(&mut self, message: &Message, counts_as_unread: bool) -> Result<u32> {
        let conversation = self.get_mut(&message.conversation_id)?;
        conversation.last_message = Some(message.clone());
        if counts_as_unread {
            conversation.unread_count += 1;
        }
        Ok(conversation.unread_count)
    }

    /// Overwrite the unread counter, used when seeding from existing messages
    pub fn set_unread(&mut self, id: &str, unread_count: u32) -> Result<()> {
        self.get_mut(id)?.unread_count = unread_count;
        Ok(())
    }
}
