//! Draft model: an unsent message owned by a user.

use super::{DraftId, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    pub message: Message,
}
