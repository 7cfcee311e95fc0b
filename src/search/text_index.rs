//! Direct-scan text matching over message content, standing in for a
//! persisted full-text index (see DESIGN.md for why this is a scan rather
//! than a Tantivy-style segment index).

use crate::models::{Message, MessagePartBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentField {
    Subject,
    Body,
    Sender,
    Recipient,
}

/// Extract the plain-text content of a message part's inline body, decoding
/// it from base64url if present.
pub(crate) fn body_text(message: &Message) -> String {
    let mut out = String::new();
    for part in message.payload.flat_parts() {
        if let MessagePartBody { data: Some(data), .. } = &part.body
            && let Ok(decoded) = base64::Engine::decode(
                &base64::engine::general_purpose::URL_SAFE_NO_PAD,
                data.as_bytes(),
            )
            && let Ok(text) = String::from_utf8(decoded)
        {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&text);
        }
    }
    out
}

pub fn field_text(message: &Message, field: ContentField) -> String {
    match field {
        ContentField::Subject => message.subject.clone(),
        ContentField::Body => body_text(message),
        ContentField::Sender => message.from.display(),
        ContentField::Recipient => message
            .to
            .iter()
            .map(|a| a.display())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Case-insensitive substring containment check of `needle` within the given
/// field of a message.
pub fn field_contains(message: &Message, field: ContentField, needle: &str) -> bool {
    field_text(message, field)
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Case-insensitive substring containment across subject, body, sender, and
/// recipient — the scope used by bare-keyword free-text search.
pub fn matches_anywhere(message: &Message, needle: &str) -> bool {
    [
        ContentField::Subject,
        ContentField::Body,
        ContentField::Sender,
        ContentField::Recipient,
    ]
    .iter()
    .any(|field| field_contains(message, *field, needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailAddress, MessageId, ThreadId};

    fn msg() -> Message {
        Message::builder(MessageId::new("m1"), ThreadId::new("t1"))
            .from(EmailAddress::with_name("Alice", "alice@example.com"))
            .subject("Quarterly Report")
            .build()
    }

    #[test]
    fn test_field_contains_subject_case_insensitive() {
        assert!(field_contains(&msg(), ContentField::Subject, "quarterly"));
        assert!(!field_contains(&msg(), ContentField::Subject, "invoice"));
    }

    #[test]
    fn test_matches_anywhere_sender() {
        assert!(matches_anywhere(&msg(), "alice"));
    }
}
