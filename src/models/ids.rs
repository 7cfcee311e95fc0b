//! Newtype identifiers shared across the data model.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype_id!(UserId);
newtype_id!(MessageId);
newtype_id!(ThreadId);
newtype_id!(DraftId);
newtype_id!(LabelId);

impl LabelId {
    pub const INBOX: &'static str = "INBOX";
    pub const SENT: &'static str = "SENT";
    pub const DRAFT: &'static str = "DRAFT";
    pub const TRASH: &'static str = "TRASH";
    pub const SPAM: &'static str = "SPAM";
    pub const STARRED: &'static str = "STARRED";
    pub const IMPORTANT: &'static str = "IMPORTANT";
    pub const UNREAD: &'static str = "UNREAD";
    pub const CATEGORY_PERSONAL: &'static str = "CATEGORY_PERSONAL";
    pub const CATEGORY_SOCIAL: &'static str = "CATEGORY_SOCIAL";
    pub const CATEGORY_PROMOTIONS: &'static str = "CATEGORY_PROMOTIONS";
    pub const CATEGORY_UPDATES: &'static str = "CATEGORY_UPDATES";
    pub const CATEGORY_FORUMS: &'static str = "CATEGORY_FORUMS";

    /// The full allow-list of names recognized as system labels. Used to
    /// decide auto-create casing rules; does not imply all of these exist
    /// after `reset_db` (see `store::reset_db`).
    pub const SYSTEM_LABELS: &'static [&'static str] = &[
        Self::INBOX,
        Self::SENT,
        Self::DRAFT,
        Self::TRASH,
        Self::SPAM,
        Self::STARRED,
        Self::IMPORTANT,
        Self::UNREAD,
        Self::CATEGORY_PERSONAL,
        Self::CATEGORY_SOCIAL,
        Self::CATEGORY_PROMOTIONS,
        Self::CATEGORY_UPDATES,
        Self::CATEGORY_FORUMS,
    ];

    pub fn is_system(id: &str) -> bool {
        let upper = id.to_ascii_uppercase();
        Self::SYSTEM_LABELS.contains(&upper.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_label_recognition_is_case_insensitive() {
        assert!(LabelId::is_system("inbox"));
        assert!(LabelId::is_system("INBOX"));
        assert!(!LabelId::is_system("Label_123"));
    }
}
