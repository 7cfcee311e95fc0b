//! Thread model: a conversation grouping one or more messages.

use super::{MessageId, ThreadId};
use serde::{Deserialize, Serialize};

/// A thread groups messages that share a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    #[serde(default)]
    pub snippet: String,
    pub history_id: String,
    /// Message IDs in arrival order.
    #[serde(default)]
    pub message_ids: Vec<MessageId>,
}

impl Thread {
    pub fn new(id: ThreadId, history_id: impl Into<String>) -> Self {
        Self {
            id,
            snippet: String::new(),
            history_id: history_id.into(),
            message_ids: Vec::new(),
        }
    }
}
