//! Podium Chat - the messaging view of the speaker portal
//!
//! An in-memory conversation and message model with a simulated delivery
//! service standing in for a real-time transport.
//!
//! # Architecture
//!
//! - **ConversationStore**: ordered conversations, active selection, unread counters
//! - **MessageStore**: append-only message history per conversation
//! - **SimulatedDelivery**: delayed canned replies with a configurable probability
//! - **ChatService**: owns both stores and keeps unread counters consistent with
//!   the message history; publishes [`ChatEvent`]s to the front end
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use podium_chat::{ChatConfig, ChatEvent, ChatService};
//!
//! # async fn example() -> Result<(), podium_chat::ChatError> {
//! let (chat, mut events) = ChatService::new(ChatConfig::default())?;
//!
//! chat.select_conversation("conv-1")?;
//! let (_sent, pending) = chat.send_message("See you on Friday!")?;
//! if let Some(reply) = pending {
//!     reply.wait().await;
//! }
//!
//! while let Ok(event) = events.try_recv() {
//!     if let ChatEvent::Notification(toast) = event {
//!         println!("{}: {}", toast.title, toast.description);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod conversation_store;
pub mod delivery;
pub mod message_store;
pub mod seed;
pub mod service;

mod error;
mod events;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ChatConfig, ChatConfigUpdates, DEFAULT_NOTIFICATION_TITLE, DEFAULT_REPLY_BODY};
pub use conversation_store::ConversationStore;
pub use delivery::{FixedRandom, PendingReply, RandomSource, SimulatedDelivery, ThreadRandom};
pub use error::{ChatError, Result};
pub use events::{ChatEvent, Conversation, Message, Notification, Participant};
pub use message_store::MessageStore;
pub use seed::{SeedData, SeedMessage};
pub use service::ChatService;
