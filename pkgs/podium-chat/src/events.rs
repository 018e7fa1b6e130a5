//! Entity model and event types for the messaging view

use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A member of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Avatar fallback: first letter of each word of the name
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect()
    }
}

/// A single chat message. Only `is_read` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// A thread between two or more participants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<Participant>,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}

impl Conversation {
    /// Build a conversation, checking the participant set
    pub fn new(id: impl Into<String>, participants: Vec<Participant>) -> Result<Self> {
        let id = id.into();

        if participants.len() < 2 {
            return Err(ChatError::Validation(format!(
                "conversation '{}' needs at least two participants",
                id
            )));
        }

        let mut seen = HashSet::new();
        for participant in &participants {
            if !seen.insert(participant.id.as_str()) {
                return Err(ChatError::Validation(format!(
                    "duplicate participant '{}' in conversation '{}'",
                    participant.id, id
                )));
            }
        }

        Ok(Self {
            id,
            participants,
            last_message: None,
            unread_count: 0,
        })
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// First participant who is not the current user.
    ///
    /// `None` only for a conversation with no other member.
    pub fn counterpart(&self, current_user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != current_user_id)
    }

    /// Title shown in the conversation list
    pub fn display_name(&self, current_user_id: &str) -> String {
        let Some(other) = self.counterpart(current_user_id) else {
            return self.id.clone();
        };
        if self.participants.len() > 2 {
            format!("{} + {} others", other.name, self.participants.len() - 2)
        } else {
            other.name.clone()
        }
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.timestamp)
    }
}

/// User-visible toast raised when a reply arrives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

/// Events published by the chat service to its front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    MessageAppended { message: Message },
    ConversationSelected { conversation_id: String },
    UnreadChanged { conversation_id: String, unread_count: u32 },
    Notification(Notification),
}
