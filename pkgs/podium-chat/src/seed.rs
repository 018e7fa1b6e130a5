//! Fixed conversation list the speaker portal starts with

use crate::error::Result;
use crate::events::{Conversation, Participant};
use chrono::Duration;

/// A message present before the service starts
#[derive(Debug, Clone)]
pub struct SeedMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    /// How long ago the message was sent, relative to service start
    pub age: Duration,
    pub is_read: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<SeedMessage>,
}

impl SeedData {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Three conversations: two direct threads and one small group.
    /// Unread counts come out as 2, 0 and 5.
    pub fn speaker_portal(current_user: &Participant) -> Result<Self> {
        let jane = Participant::new("user-456", "Jane Smith");
        let alex = Participant::new("user-789", "Alex Johnson");
        let sarah = Participant::new("user-101", "Sarah Williams");
        let mike = Participant::new("user-102", "Mike Davis");
        let me = current_user.id.as_str();

        let conversations = vec![
            Conversation::new("conv-1", vec![current_user.clone(), jane.clone()])?,
            Conversation::new("conv-2", vec![current_user.clone(), alex.clone()])?,
            Conversation::new(
                "conv-3",
                vec![current_user.clone(), sarah.clone(), mike.clone()],
            )?,
        ];

        let messages = vec![
            seed(
                "conv-1",
                &jane.id,
                "Hi there! How are you preparing for your talk next week?",
                Duration::hours(24),
                true,
            ),
            seed(
                "conv-1",
                me,
                "I'm working on my slides right now. Almost done with the introduction section!",
                Duration::hours(23),
                true,
            ),
            seed(
                "conv-1",
                &jane.id,
                "That's great! Would you like me to review them before the event?",
                Duration::hours(1),
                false,
            ),
            seed(
                "conv-1",
                &jane.id,
                "Also, don't forget we have a pre-event meeting on Friday.",
                Duration::minutes(30),
                false,
            ),
            seed(
                "conv-2",
                &alex.id,
                "Are you joining the speaker dinner on Thursday?",
                Duration::hours(50),
                true,
            ),
            seed("conv-2", me, "Yes, count me in!", Duration::hours(49), true),
            seed("conv-3", &sarah.id, "Welcome to the panel thread!", Duration::hours(6), false),
            seed("conv-3", &mike.id, "Glad to have you on board.", Duration::hours(5), false),
            seed(
                "conv-3",
                &sarah.id,
                "We start with five minute openings from each panelist.",
                Duration::hours(4),
                false,
            ),
            seed(
                "conv-3",
                &mike.id,
                "The moderator will send questions by Wednesday.",
                Duration::hours(3),
                false,
            ),
            seed(
                "conv-3",
                &sarah.id,
                "Let us know if you need any AV equipment.",
                Duration::hours(2),
                false,
            ),
        ];

        Ok(Self {
            conversations,
            messages,
        })
    }
}

fn seed(
    conversation_id: &str,
    sender_id: &str,
    content: &str,
    age: Duration,
    is_read: bool,
) -> SeedMessage {
    SeedMessage {
        conversation_id: conversation_id.to_string(),
        sender_id: sender_id.to_string(),
        content: content.to_string(),
        age,
        is_read,
    }
}
