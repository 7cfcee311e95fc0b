//! Label model: a Gmail-style folder/tag with per-label message counters.

use super::LabelId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    System,
    User,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelCounts {
    pub messages_total: u64,
    pub messages_unread: u64,
    pub threads_total: u64,
    pub threads_unread: u64,
}

/// A mail label (folder/tag).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    #[serde(rename = "type")]
    pub label_type: LabelType,
    pub label_list_visibility: String,
    pub message_list_visibility: String,
    #[serde(flatten)]
    pub counts: LabelCounts,
}

impl Label {
    /// Build a system label with the standard visibility defaults and zero
    /// counts (matches `reset_db`/`_ensure_labels_exist` in the reference
    /// simulator: system labels are always stored uppercase).
    pub fn system(id: impl Into<String>) -> Self {
        let id = id.into().to_ascii_uppercase();
        Self {
            name: id.clone(),
            id: LabelId::new(id),
            label_type: LabelType::System,
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
            counts: LabelCounts::default(),
        }
    }

    /// Build a user label, preserving the caller's original casing.
    pub fn user(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: LabelId::new(id.into()),
            name: name.into(),
            label_type: LabelType::User,
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
            counts: LabelCounts::default(),
        }
    }
}
