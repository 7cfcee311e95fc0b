//! Attachment model: content-addressed binary data shared across users.

use serde::{Deserialize, Serialize};

/// A single attachment stored in the process-global, content-hash-addressed
/// attachment table. Reference-counted so an attachment shared by multiple
/// messages (e.g. forwarded mail) is stored once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub attachment_id: String,
    pub data: String,
    pub file_size: u64,
    #[serde(default)]
    pub ref_count: u64,
}

impl Attachment {
    pub fn new(attachment_id: impl Into<String>, data: impl Into<String>, file_size: u64) -> Self {
        Self {
            attachment_id: attachment_id.into(),
            data: data.into(),
            file_size,
            ref_count: 1,
        }
    }
}
