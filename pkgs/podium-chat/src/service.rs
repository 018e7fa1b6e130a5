//! Chat service - the single store object shared by the front end and the
//! reply timers. Keeps the unread counters in step with the message history.

use crate::clock::{Clock, SystemClock};
use crate::config::ChatConfig;
use crate::conversation_store::ConversationStore;
use crate::delivery::{PendingReply, RandomSource, SimulatedDelivery, ThreadRandom};
use crate::error::{ChatError, Result};
use crate::events::{ChatEvent, Conversation, Message, Notification, Participant};
use crate::message_store::MessageStore;
use crate::seed::SeedData;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

struct PendingEntry {
    id: u64,
    conversation_id: String,
    abort: AbortHandle,
}

struct ChatState {
    config: ChatConfig,
    conversations: ConversationStore,
    messages: MessageStore,
    delivery: SimulatedDelivery,
    pending: Vec<PendingEntry>,
    next_reply_id: u64,
}

/// Result of a successful append, before events are published
struct Appended {
    message: Message,
    unread_count: Option<u32>,
}

impl ChatState {
    fn append(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        clock: &dyn Clock,
    ) -> Result<Appended> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .ok_or_else(|| ChatError::conversation_not_found(conversation_id))?;
        let sender = conversation.participant(sender_id).cloned().ok_or_else(|| {
            ChatError::Validation(format!(
                "'{}' is not a participant of conversation '{}'",
                sender_id, conversation_id
            ))
        })?;

        let is_active = self.conversations.is_active(conversation_id);
        let is_outgoing = sender_id == self.config.current_user.id;
        if is_outgoing && !is_active {
            return Err(ChatError::Validation(format!(
                "conversation '{}' has no active selection",
                conversation_id
            )));
        }

        // Only conversations off screen move to unread(n + 1)
        let counts_as_unread = !is_outgoing && !is_active;

        let message =
            self.messages
                .append_message(conversation_id, &sender, content, clock.now(), false)?;
        let unread_count = self
            .conversations
            .record_message(&message, counts_as_unread)?;

        Ok(Appended {
            message,
            unread_count: counts_as_unread.then_some(unread_count),
        })
    }

    fn cancel_pending(&mut self, conversation_id: &str) -> usize {
        let mut cancelled = 0;
        self.pending.retain(|entry| {
            if entry.conversation_id == conversation_id {
                entry.abort.abort();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        cancelled
    }

    fn load_seed(&mut self, seed: SeedData, clock: &dyn Clock) -> Result<()> {
        let now = clock.now();
        let reader = self.config.current_user.id.clone();

        for conversation in seed.conversations {
            self.conversations.insert(conversation)?;
        }

        for message in seed.messages {
            let conversation = self
                .conversations
                .get(&message.conversation_id)
                .ok_or_else(|| ChatError::conversation_not_found(&message.conversation_id))?;
            let sender = conversation
                .participant(&message.sender_id)
                .cloned()
                .ok_or_else(|| {
                    ChatError::Validation(format!(
                        "seed sender '{}' is not in conversation '{}'",
                        message.sender_id, message.conversation_id
                    ))
                })?;
            let is_read = message.is_read || message.sender_id == reader;
            self.messages.append_message(
                &message.conversation_id,
                &sender,
                &message.content,
                now - message.age,
                is_read,
            )?;
        }

        for conversation in self.conversations.list_conversations() {
            if let Some(last) = self.messages.list_messages(&conversation.id).last() {
                self.conversations.record_message(last, false)?;
            }
            let unread = self.messages.unread_incoming(&conversation.id, &reader);
            self.conversations.set_unread(&conversation.id, unread as u32)?;
        }

        Ok(())
    }
}

/// Handle to the chat state. Cloning is cheap and all clones share state.
#[derive(Clone)]
pub struct ChatService {
    state: Arc<Mutex<ChatState>>,
    clock: Arc<dyn Clock>,
    event_sender: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatService {
    /// Service over the default speaker portal conversations
    pub fn new(config: ChatConfig) -> Result<(Self, mpsc::UnboundedReceiver<ChatEvent>)> {
        let seed = SeedData::speaker_portal(&config.current_user)?;
        Self::with_parts(
            config,
            seed,
            Arc::new(SystemClock),
            Box::new(ThreadRandom::new()),
        )
    }

    /// Service with explicit seed, clock and random source
    pub fn with_parts(
        config: ChatConfig,
        seed: SeedData,
        clock: Arc<dyn Clock>,
        random: Box<dyn RandomSource>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChatEvent>)> {
        config.validate()?;

        let delivery =
            SimulatedDelivery::new(config.reply_probability, config.reply_delay(), random);
        let mut state = ChatState {
            config,
            conversations: ConversationStore::new(),
            messages: MessageStore::new(),
            delivery,
            pending: Vec::new(),
            next_reply_id: 0,
        };
        state.load_seed(seed, clock.as_ref())?;

        info!(
            "Chat service initialized with {} conversations",
            state.conversations.len()
        );

        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let service = Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            event_sender,
        };
        Ok((service, event_receiver))
    }

    pub fn current_user(&self) -> Participant {
        self.state.lock().config.current_user.clone()
    }

    pub fn config(&self) -> ChatConfig {
        self.state.lock().config.clone()
    }

    /// Conversations in the order they were added
    pub fn list_conversations(&self) -> Vec<Conversation> {
        self.state.lock().conversations.list_conversations()
    }

    /// Conversations with the newest message first
    pub fn list_conversations_by_recency(&self) -> Vec<Conversation> {
        self.state.lock().conversations.list_by_recency()
    }

    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.state.lock().conversations.get(id).cloned()
    }

    pub fn active_conversation_id(&self) -> Option<String> {
        self.state
            .lock()
            .conversations
            .active_conversation_id()
            .map(str::to_string)
    }

    /// Message history of a conversation, oldest first
    pub fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let state = self.state.lock();
        if !state.conversations.contains(conversation_id) {
            return Err(ChatError::conversation_not_found(conversation_id));
        }
        Ok(state.messages.list_messages(conversation_id))
    }

    /// Make a conversation active and mark its history read
    pub fn select_conversation(&self, id: &str) -> Result<()> {
        let (marked, cancelled) = {
            let mut state = self.state.lock();
            let previous = match state.conversations.select_conversation(id) {
                Ok(previous) => previous,
                Err(e) => {
                    warn!("Ignoring selection of unknown conversation {}", id);
                    return Err(e);
                }
            };
            let reader = state.config.current_user.id.clone();
            let marked = state.messages.mark_conversation_read(id, &reader);

            let cancelled = match previous {
                Some(previous) if previous != id && state.config.cancel_on_deselect => {
                    state.cancel_pending(&previous)
                }
                _ => 0,
            };
            (marked, cancelled)
        };

        debug!("Marked {} messages read in {}", marked, id);
        if cancelled > 0 {
            info!("Cancelled {} pending replies on deselect", cancelled);
        }

        self.emit(ChatEvent::ConversationSelected {
            conversation_id: id.to_string(),
        });
        self.emit(ChatEvent::UnreadChanged {
            conversation_id: id.to_string(),
            unread_count: 0,
        });
        Ok(())
    }

    /// Leave no conversation active
    pub fn clear_selection(&self) -> Option<String> {
        let mut state = self.state.lock();
        let previous = state.conversations.clear_selection();
        if let Some(previous) = previous.as_deref() {
            if state.config.cancel_on_deselect {
                let cancelled = state.cancel_pending(previous);
                debug!("Cancelled {} pending replies for {}", cancelled, previous);
            }
        }
        previous
    }

    /// Append a message from any participant of the conversation.
    ///
    /// Messages from the current user need the conversation to be active;
    /// incoming messages are accepted anywhere and bump the unread counter
    /// of a conversation that is not on screen.
    pub fn append_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message> {
        let appended = self.state.lock().append(
            conversation_id,
            sender_id,
            content,
            self.clock.as_ref(),
        )?;

        self.emit(ChatEvent::MessageAppended {
            message: appended.message.clone(),
        });
        if let Some(unread_count) = appended.unread_count {
            self.emit(ChatEvent::UnreadChanged {
                conversation_id: conversation_id.to_string(),
                unread_count,
            });
        }
        Ok(appended.message)
    }

    /// Send as the current user into the active conversation and maybe
    /// schedule a reply from its counterpart.
    pub fn send_message(&self, content: &str) -> Result<(Message, Option<PendingReply>)> {
        let (conversation_id, user_id) = {
            let state = self.state.lock();
            let active = state
                .conversations
                .active_conversation_id()
                .map(str::to_string)
                .ok_or_else(|| ChatError::Validation("no active conversation".to_string()))?;
            (active, state.config.current_user.id.clone())
        };

        let message = self.append_message(&conversation_id, &user_id, content)?;

        let counterpart = self
            .conversation(&conversation_id)
            .ok_or_else(|| ChatError::conversation_not_found(&conversation_id))?
            .counterpart(&user_id)
            .cloned()
            .ok_or_else(|| {
                ChatError::Validation(format!(
                    "conversation '{}' has nobody to reply",
                    conversation_id
                ))
            })?;
        let pending = self.schedule_simulated_reply(&conversation_id, counterpart)?;

        Ok((message, pending))
    }

    /// Maybe schedule a canned reply from `from` into the conversation.
    ///
    /// Returns `None` when the roll decides against a reply. Must be called
    /// from within a tokio runtime.
    pub fn schedule_simulated_reply(
        &self,
        conversation_id: &str,
        from: Participant,
    ) -> Result<Option<PendingReply>> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ChatError::Config(
                "simulated replies need a tokio runtime".to_string(),
            ));
        }

        let mut state = self.state.lock();
        let conversation = state
            .conversations
            .get(conversation_id)
            .ok_or_else(|| ChatError::conversation_not_found(conversation_id))?;
        if conversation.participant(&from.id).is_none() {
            return Err(ChatError::Validation(format!(
                "'{}' cannot reply in conversation '{}'",
                from.id, conversation_id
            )));
        }

        state.next_reply_id += 1;
        let reply_id = state.next_reply_id;
        let service = self.clone();
        let target = conversation_id.to_string();

        let Some(handle) = state
            .delivery
            .schedule(move || service.deliver_reply(reply_id, &target, &from))
        else {
            return Ok(None);
        };

        state.pending.push(PendingEntry {
            id: reply_id,
            conversation_id: conversation_id.to_string(),
            abort: handle.abort_handle(),
        });
        debug!("Scheduled reply {} for {}", reply_id, conversation_id);

        Ok(Some(PendingReply::new(
            reply_id,
            conversation_id.to_string(),
            handle,
        )))
    }

    /// Abort every reply still pending for a conversation
    pub fn cancel_pending_replies(&self, conversation_id: &str) -> usize {
        self.state.lock().cancel_pending(conversation_id)
    }

    pub fn pending_reply_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Add a new conversation with the current user and `others`
    pub fn start_conversation(&self, others: Vec<Participant>) -> Result<Conversation> {
        let mut state = self.state.lock();
        let current_user = state.config.current_user.clone();

        let mut participants = vec![current_user.clone()];
        participants.extend(others.into_iter().filter(|p| p.id != current_user.id));

        let id = format!("conv-{}", uuid::Uuid::new_v4());
        let conversation = Conversation::new(id, participants)?;
        state.conversations.insert(conversation.clone())?;

        info!("Started conversation {}", conversation.id);
        Ok(conversation)
    }

    fn deliver_reply(&self, reply_id: u64, conversation_id: &str, from: &Participant) {
        let body = {
            let mut state = self.state.lock();
            let before = state.pending.len();
            state.pending.retain(|entry| entry.id != reply_id);
            if state.pending.len() == before {
                debug!("Reply {} was cancelled before it landed", reply_id);
                return;
            }
            state.config.reply_body.clone()
        };

        match self.append_message(conversation_id, &from.id, &body) {
            Ok(_) => {
                let title = self.state.lock().config.notification_title.clone();
                info!("{} replied in {}", from.name, conversation_id);
                self.emit(ChatEvent::Notification(Notification {
                    title,
                    description: format!("{} has replied to your message.", from.name),
                }));
            }
            Err(e) => warn!("Dropping simulated reply {}: {}", reply_id, e),
        }
    }

    fn emit(&self, event: ChatEvent) {
        if self.event_sender.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}
