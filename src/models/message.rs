//! Message model: a single email within a thread, Gmail-resource-shaped.

use super::{MessageId, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An email address with optional display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub email: String,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an address from a string like `John Doe <john@example.com>`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// The body of a message part: either inline data or a reference to an
/// attachment stored in the global, content-addressed attachment table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
}

/// A single MIME part of a message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub part_id: String,
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: MessagePartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// The top-level MIME structure of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: MessagePartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePayload {
    /// Flatten the part tree in document order.
    pub fn flat_parts(&self) -> Vec<&MessagePart> {
        fn walk<'a>(parts: &'a [MessagePart], out: &mut Vec<&'a MessagePart>) {
            for part in parts {
                out.push(part);
                walk(&part.parts, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.parts, &mut out);
        out
    }
}

/// A single email message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: String,
    pub history_id: String,
    /// Milliseconds since the epoch, matching the Gmail wire convention.
    pub internal_date: i64,
    pub from: EmailAddress,
    #[serde(default)]
    pub to: Vec<EmailAddress>,
    #[serde(default)]
    pub cc: Vec<EmailAddress>,
    #[serde(default)]
    pub bcc: Vec<EmailAddress>,
    #[serde(default)]
    pub subject: String,
    pub payload: MessagePayload,
    #[serde(default)]
    pub size_estimate: u64,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        !self.is_read || self.label_ids.iter().any(|l| l.eq_ignore_ascii_case("UNREAD"))
    }

    pub fn is_starred(&self) -> bool {
        self.label_ids.iter().any(|l| l.eq_ignore_ascii_case("STARRED"))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_ids.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn builder(id: MessageId, thread_id: ThreadId) -> MessageBuilder {
        MessageBuilder::new(id, thread_id)
    }
}

/// Builder for constructing `Message` values.
pub struct MessageBuilder {
    id: MessageId,
    thread_id: ThreadId,
    from: Option<EmailAddress>,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    subject: String,
    snippet: String,
    history_id: String,
    internal_date: i64,
    label_ids: Vec<String>,
    payload: Option<MessagePayload>,
    size_estimate: u64,
}

impl MessageBuilder {
    fn new(id: MessageId, thread_id: ThreadId) -> Self {
        Self {
            id,
            thread_id,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: String::new(),
            snippet: String::new(),
            history_id: "1".to_string(),
            internal_date: 0,
            label_ids: Vec::new(),
            payload: None,
            size_estimate: 0,
        }
    }

    pub fn from(mut self, from: EmailAddress) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Vec<EmailAddress>) -> Self {
        self.to = to;
        self
    }

    pub fn cc(mut self, cc: Vec<EmailAddress>) -> Self {
        self.cc = cc;
        self
    }

    pub fn bcc(mut self, bcc: Vec<EmailAddress>) -> Self {
        self.bcc = bcc;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn history_id(mut self, history_id: impl Into<String>) -> Self {
        self.history_id = history_id.into();
        self
    }

    pub fn internal_date(mut self, internal_date: i64) -> Self {
        self.internal_date = internal_date;
        self
    }

    pub fn label_ids(mut self, label_ids: Vec<String>) -> Self {
        self.label_ids = label_ids;
        self
    }

    pub fn payload(mut self, payload: MessagePayload) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn size_estimate(mut self, size: u64) -> Self {
        self.size_estimate = size;
        self
    }

    pub fn build(self) -> Message {
        let is_read = !self.label_ids.iter().any(|l| l.eq_ignore_ascii_case("UNREAD"));
        Message {
            id: self.id,
            thread_id: self.thread_id,
            label_ids: self.label_ids,
            snippet: self.snippet,
            history_id: self.history_id,
            internal_date: self.internal_date,
            from: self.from.unwrap_or_else(|| EmailAddress::new("unknown@unknown.com")),
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject: self.subject,
            payload: self.payload.unwrap_or_else(|| MessagePayload {
                mime_type: "text/plain".to_string(),
                headers: Vec::new(),
                body: MessagePartBody::default(),
                parts: Vec::new(),
            }),
            size_estimate: self.size_estimate,
            received_at: Some(Utc::now()),
            is_read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_email_with_name() {
        let addr = EmailAddress::parse("John Doe <john@example.com>");
        assert_eq!(addr.name, Some("John Doe".to_string()));
        assert_eq!(addr.email, "john@example.com");
    }

    #[test]
    fn test_parse_email_without_name() {
        let addr = EmailAddress::parse("john@example.com");
        assert_eq!(addr.name, None);
        assert_eq!(addr.email, "john@example.com");
    }

    #[test]
    fn test_display_with_name() {
        let addr = EmailAddress::with_name("John Doe", "john@example.com");
        assert_eq!(addr.display(), "John Doe <john@example.com>");
    }

    #[test]
    fn test_is_unread_from_label_or_flag() {
        let mut msg = Message::builder(MessageId::new("m1"), ThreadId::new("t1"))
            .label_ids(vec!["INBOX".to_string()])
            .build();
        msg.is_read = true;
        assert!(!msg.is_unread());
        msg.label_ids.push("UNREAD".to_string());
        assert!(msg.is_unread());
    }
}
