//! MIME build/parse and the attachment pipeline.

use crate::error::{MailError, Result};
use crate::models::{Attachment, EmailAddress, Message, MessagePart, MessagePartBody, MessagePayload};
use crate::store::Store;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Structured input for constructing a message without hand-assembling raw
/// MIME text.
#[derive(Debug, Clone, Default)]
pub struct ComposeInput {
    pub from: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub bcc: Vec<EmailAddress>,
    pub subject: String,
    pub body_text: String,
    pub attachments: Vec<ComposeAttachment>,
}

#[derive(Debug, Clone)]
pub struct ComposeAttachment {
    pub filename: String,
    pub mime_type: String,
    /// Raw (non-base64) bytes; encoded and content-hashed by `build_raw`.
    pub data: Vec<u8>,
}

/// Build a `MessagePayload` from structured compose input, writing any
/// attachments into the store's global, content-addressed attachment table.
pub fn build_raw(store: &Store, input: ComposeInput) -> MessagePayload {
    let mut parts = Vec::new();

    parts.push(MessagePart {
        part_id: "0".to_string(),
        mime_type: "text/plain".to_string(),
        filename: String::new(),
        headers: Vec::new(),
        body: MessagePartBody {
            size: Some(input.body_text.len() as u64),
            data: Some(URL_SAFE_NO_PAD.encode(input.body_text.as_bytes())),
            attachment_id: None,
        },
        parts: Vec::new(),
    });

    for (i, att) in input.attachments.into_iter().enumerate() {
        let attachment_id = content_hash(&att.data);
        let file_size = att.data.len() as u64;
        let data = URL_SAFE_NO_PAD.encode(&att.data);
        store.put_attachment(Attachment::new(attachment_id.clone(), data, file_size));

        parts.push(MessagePart {
            part_id: (i + 1).to_string(),
            mime_type: att.mime_type,
            filename: att.filename,
            headers: Vec::new(),
            body: MessagePartBody {
                size: Some(file_size),
                data: None,
                attachment_id: Some(attachment_id),
            },
            parts: Vec::new(),
        });
    }

    MessagePayload {
        mime_type: "multipart/mixed".to_string(),
        headers: Vec::new(),
        body: MessagePartBody::default(),
        parts,
    }
}

/// Parse an already-base64url-encoded raw MIME blob into a `MessagePayload`.
/// This simulator does not implement a full RFC 5322/MIME parser (out of
/// scope); it accepts either a bare text body or a `key: value` header block
/// followed by a blank line and a body, enough to round-trip what `build_raw`
/// produces and to exercise the send/import path end to end.
pub fn parse_raw(raw: &str) -> Result<MessagePayload> {
    let decoded = URL_SAFE_NO_PAD
        .decode(raw.trim())
        .map_err(|e| MailError::InvalidRaw(format!("raw is not valid base64url: {e}")))?;
    let text = String::from_utf8(decoded)
        .map_err(|e| MailError::InvalidRaw(format!("raw is not valid UTF-8: {e}")))?;

    let body_text = match text.split_once("\n\n") {
        Some((_, body)) => body.to_string(),
        None => text,
    };

    Ok(MessagePayload {
        mime_type: "text/plain".to_string(),
        headers: Vec::new(),
        body: MessagePartBody {
            size: Some(body_text.len() as u64),
            data: Some(URL_SAFE_NO_PAD.encode(body_text.as_bytes())),
            attachment_id: None,
        },
        parts: Vec::new(),
    })
}

/// Deterministic content hash used as the attachment id, so two identical
/// attachments (e.g. the same file forwarded twice) are stored once.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Best-effort normalization of phone-number-shaped string fields found
/// anywhere in a free-form JSON value. The real E.164 normalizer is an
/// external collaborator outside this crate's scope; this is a pass-through
/// fallback so the pipeline is exercisable standalone, not a full
/// implementation.
pub fn normalize_phone_like_fields(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("phone")
                    && let serde_json::Value::String(s) = v
                {
                    *s = normalize_phone_string(s);
                }
                normalize_phone_like_fields(v);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                normalize_phone_like_fields(item);
            }
        }
        _ => {}
    }
}

fn normalize_phone_string(s: &str) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    if digits.is_empty() { s.to_string() } else { digits }
}

/// Fetch an attachment for a message, re-validating that the attachment is
/// actually referenced from one of the message's parts before returning
/// data. Returns `Ok(None)` (not an error) if the message, the reference, or
/// the attachment itself is missing, matching the reference simulator's
/// `Attachments.get`.
pub fn get_attachment(store: &Store, message: &Message, attachment_id: &str) -> Option<Attachment> {
    let referenced = message
        .payload
        .flat_parts()
        .iter()
        .any(|part| part.body.attachment_id.as_deref() == Some(attachment_id));
    if !referenced {
        return None;
    }
    store.get_attachment(attachment_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_raw_hashes_attachment_content() {
        let store = Store::empty();
        let input = ComposeInput {
            subject: "hi".to_string(),
            body_text: "hello".to_string(),
            attachments: vec![ComposeAttachment {
                filename: "a.txt".to_string(),
                mime_type: "text/plain".to_string(),
                data: b"same bytes".to_vec(),
            }],
            ..Default::default()
        };
        let payload = build_raw(&store, input);
        assert_eq!(payload.parts.len(), 2);
        let att_id = payload.parts[1].body.attachment_id.clone().unwrap();
        assert!(store.get_attachment(&att_id).is_some());
    }

    #[test]
    fn test_same_content_shares_attachment_id() {
        let store = Store::empty();
        let att1 = ComposeAttachment {
            filename: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            data: b"identical".to_vec(),
        };
        let att2 = att1.clone();
        let p1 = build_raw(&store, ComposeInput { attachments: vec![att1], ..Default::default() });
        let p2 = build_raw(&store, ComposeInput { attachments: vec![att2], ..Default::default() });
        assert_eq!(
            p1.parts[1].body.attachment_id,
            p2.parts[1].body.attachment_id
        );
        let id = p1.parts[1].body.attachment_id.clone().unwrap();
        assert_eq!(store.get_attachment(&id).unwrap().ref_count, 2);
    }

    #[test]
    fn test_get_attachment_requires_reference() {
        let store = Store::empty();
        store.put_attachment(Attachment::new("orphan", "ZGF0YQ", 4));
        let message = Message::builder(
            crate::models::MessageId::new("m1"),
            crate::models::ThreadId::new("t1"),
        )
        .build();
        assert!(get_attachment(&store, &message, "orphan").is_none());
    }
}
