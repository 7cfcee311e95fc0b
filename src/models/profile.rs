//! User profile: the small summary block Gmail's `getProfile` returns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email_address: String,
    pub messages_total: u64,
    pub threads_total: u64,
    pub history_id: String,
}

impl Profile {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            messages_total: 0,
            threads_total: 0,
            history_id: "1".to_string(),
        }
    }
}
