//! Per-user aggregate: everything a single mailbox tenant owns.

use super::{
    Draft, DraftId, HistoryRecord, Label, LabelId, Message, MessageId, Profile, Settings, Thread,
    ThreadId, Watch,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type History = Vec<HistoryRecord>;

/// The full state owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub profile: Profile,
    #[serde(default)]
    pub messages: HashMap<MessageId, Message>,
    #[serde(default)]
    pub threads: HashMap<ThreadId, Thread>,
    #[serde(default)]
    pub drafts: HashMap<DraftId, Draft>,
    #[serde(default)]
    pub labels: HashMap<LabelId, Label>,
    pub settings: Settings,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub watch: Option<Watch>,
}

impl UserData {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            profile: Profile::new(email_address),
            messages: HashMap::new(),
            threads: HashMap::new(),
            drafts: HashMap::new(),
            labels: HashMap::new(),
            settings: Settings::default(),
            history: Vec::new(),
            watch: None,
        }
    }
}
