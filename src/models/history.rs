//! History log: an append-only record of mailbox-mutating events.

use super::{LabelId, MessageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum HistoryEvent {
    MessageAdded { message_id: MessageId },
    MessageDeleted { message_id: MessageId },
    LabelsAdded { message_id: MessageId, label_ids: Vec<LabelId> },
    LabelsRemoved { message_id: MessageId, label_ids: Vec<LabelId> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub event: HistoryEvent,
}
