use crate::error::{ChatError, Result};
use crate::events::Participant;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REPLY_BODY: &str = "Thanks for your message! I'll get back to you soon.";
pub const DEFAULT_NOTIFICATION_TITLE: &str = "New Message";

/// Configuration for the chat service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// The local user; messages from anyone else count as incoming
    pub current_user: Participant,

    /// Chance that a sent message gets a simulated reply (default: 0.5)
    pub reply_probability: f64,

    /// Delay before a simulated reply lands, in milliseconds (default: 3000)
    pub reply_delay_ms: u64,

    /// Canned body of every simulated reply
    pub reply_body: String,

    /// Title of the toast raised when a reply lands
    pub notification_title: String,

    /// Abort pending replies of a conversation when it stops being active
    pub cancel_on_deselect: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            current_user: Participant::new("user-123", "John Doe"),
            reply_probability: 0.5,
            reply_delay_ms: 3000,
            reply_body: DEFAULT_REPLY_BODY.to_string(),
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            cancel_on_deselect: false,
        }
    }
}

impl ChatConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ChatConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.reply_probability) {
            return Err(ChatError::Config(format!(
                "reply_probability must be within [0, 1], got {}",
                self.reply_probability
            )));
        }
        if self.current_user.id.trim().is_empty() {
            return Err(ChatError::Config("current_user.id is empty".to_string()));
        }
        Ok(())
    }

    /// Apply partial overrides, e.g. from command line flags
    pub fn apply(&mut self, updates: ChatConfigUpdates) {
        if let Some(probability) = updates.reply_probability {
            self.reply_probability = probability;
        }
        if let Some(delay) = updates.reply_delay_ms {
            self.reply_delay_ms = delay;
        }
        if let Some(body) = updates.reply_body {
            self.reply_body = body;
        }
        if let Some(cancel) = updates.cancel_on_deselect {
            self.cancel_on_deselect = cancel;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatConfigUpdates {
    pub reply_probability: Option<f64>,
    pub reply_delay_ms: Option<u64>,
    pub reply_body: Option<String>,
    pub cancel_on_deselect: Option<bool>,
}
