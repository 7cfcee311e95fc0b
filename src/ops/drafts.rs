//! `drafts.*`: create/update/get/list/delete/send.

use crate::error::{MailError, Result};
use crate::mime::{self, ComposeInput};
use crate::models::{Draft, DraftId, EmailAddress, Message, MessageId, ThreadId};
use crate::search;
use crate::store::Store;
use chrono::Utc;
use log::info;

fn draft_message(store: &Store, input: ComposeInput) -> Message {
    let subject = input.subject.clone();
    let to = input.to.clone();
    let cc = input.cc.clone();
    let bcc = input.bcc.clone();
    let from = input.from.clone();
    let snippet: String = input.body_text.chars().take(100).collect();
    let payload = mime::build_raw(store, input);

    Message::builder(
        MessageId::new(store.next_counter("message").to_string()),
        ThreadId::new(String::new()),
    )
    .from(from.unwrap_or_else(|| EmailAddress::new("me@gmail.com")))
    .to(to)
    .cc(cc)
    .bcc(bcc)
    .subject(subject)
    .snippet(snippet)
    .internal_date(Utc::now().timestamp_millis())
    .label_ids(vec!["DRAFT".to_string()])
    .payload(payload)
    .build()
}

pub fn create(store: &Store, user_id: &str, input: ComposeInput) -> Result<Draft> {
    let message = draft_message(store, input);
    let draft = Draft {
        id: DraftId::new(store.next_counter("draft").to_string()),
        message,
    };
    store.with_user_mut(user_id, |u| {
        u.drafts.insert(draft.id.clone(), draft.clone());
        crate::labels::recompute(u);
    })?;
    Ok(draft)
}

pub fn update(store: &Store, user_id: &str, draft_id: &str, input: ComposeInput) -> Result<Draft> {
    let message = draft_message(store, input);
    let id = DraftId::new(draft_id);
    store.with_user_mut(user_id, |u| -> Result<Draft> {
        let existing = u
            .drafts
            .get_mut(&id)
            .ok_or_else(|| MailError::resource_not_found("draft", draft_id))?;
        existing.message = message;
        let result = existing.clone();
        crate::labels::recompute(u);
        Ok(result)
    })?
}

pub fn get(store: &Store, user_id: &str, draft_id: &str) -> Result<Draft> {
    let id = DraftId::new(draft_id);
    store
        .with_user(user_id, |u| u.drafts.get(&id).cloned())?
        .ok_or_else(|| MailError::resource_not_found("draft", draft_id))
}

/// List a user's draft ids, optionally filtered by the same query language
/// used for messages (scoped to each draft's embedded message).
pub fn list(store: &Store, user_id: &str, query: Option<&str>, max_tokens: usize) -> Result<Vec<DraftId>> {
    store.with_user(user_id, |u| -> Result<Vec<DraftId>> {
        match query {
            Some(q) if !q.is_empty() => {
                let matched = search::search_drafts(&u.drafts, q, max_tokens)?;
                Ok(u.drafts.keys().filter(|id| matched.contains(id)).cloned().collect())
            }
            _ => Ok(u.drafts.keys().cloned().collect()),
        }
    })?
}

pub fn delete(store: &Store, user_id: &str, draft_id: &str) -> Result<()> {
    let id = DraftId::new(draft_id);
    store.with_user_mut(user_id, |u| -> Result<()> {
        u.drafts
            .remove(&id)
            .ok_or_else(|| MailError::resource_not_found("draft", draft_id))?;
        crate::labels::recompute(u);
        Ok(())
    })?
}

/// Send a draft: its embedded message is sent exactly like `messages.send`,
/// and the draft itself is removed.
pub fn send(store: &Store, user_id: &str, draft_id: &str) -> Result<Message> {
    let draft = get(store, user_id, draft_id)?;
    let message = draft.message;

    let input = ComposeInput {
        from: Some(message.from),
        to: message.to,
        cc: message.cc,
        bcc: message.bcc,
        subject: message.subject,
        body_text: mime_body_text(&message),
        attachments: Vec::new(),
    };

    let sent = super::messages::send(store, user_id, input)?;
    delete(store, user_id, draft_id)?;
    info!("[DRAFTS] promoted draft {draft_id} to message {}", sent.id);
    Ok(sent)
}

fn mime_body_text(message: &Message) -> String {
    use base64::Engine;
    message
        .payload
        .flat_parts()
        .first()
        .and_then(|p| p.body.data.as_ref())
        .and_then(|d| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(d).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_store() -> Store {
        let store = Store::empty();
        store.reset_db();
        store
    }

    #[test]
    fn test_create_and_get_draft() {
        let store = fresh_store();
        let draft = create(
            &store,
            "me",
            ComposeInput { subject: "draft subject".to_string(), ..Default::default() },
        )
        .unwrap();
        let fetched = get(&store, "me", draft.id.as_str()).unwrap();
        assert_eq!(fetched.message.subject, "draft subject");
    }

    #[test]
    fn test_update_draft_replaces_message() {
        let store = fresh_store();
        let draft = create(&store, "me", ComposeInput { subject: "v1".to_string(), ..Default::default() }).unwrap();
        let updated = update(
            &store,
            "me",
            draft.id.as_str(),
            ComposeInput { subject: "v2".to_string(), ..Default::default() },
        )
        .unwrap();
        assert_eq!(updated.message.subject, "v2");
    }

    #[test]
    fn test_send_draft_removes_it_and_creates_message() {
        let store = fresh_store();
        let draft = create(
            &store,
            "me",
            ComposeInput { subject: "to send".to_string(), body_text: "body".to_string(), ..Default::default() },
        )
        .unwrap();
        let sent = send(&store, "me", draft.id.as_str()).unwrap();
        assert_eq!(sent.subject, "to send");
        assert!(get(&store, "me", draft.id.as_str()).is_err());
    }

    #[test]
    fn test_list_filters_by_query() {
        let store = fresh_store();
        create(&store, "me", ComposeInput { subject: "budget".to_string(), ..Default::default() }).unwrap();
        create(&store, "me", ComposeInput { subject: "lunch".to_string(), ..Default::default() }).unwrap();
        let results = list(&store, "me", Some("subject:budget"), 10_000).unwrap();
        assert_eq!(results.len(), 1);
    }
}
