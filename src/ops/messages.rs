//! `messages.*`: send/import/insert/modify/trash/untrash/delete, plus
//! `messages.attachments.get`.

use crate::error::{MailError, Result};
use crate::mime::{self, ComposeInput};
use crate::models::{
    Attachment, EmailAddress, HistoryEvent, HistoryRecord, Message, MessageId, Thread, ThreadId,
};
use crate::search::{self, SearchPage, SearchParams};
use crate::store::Store;
use chrono::Utc;
use log::{debug, info};

fn make_snippet(body: &str) -> String {
    body.chars().take(100).collect()
}

/// List messages matching a search, scoped to spam/trash and label filters.
pub fn list(store: &Store, user_id: &str, params: SearchParams, max_tokens: usize) -> Result<SearchPage> {
    store.with_user(user_id, |u| search::search_messages(&u.messages, &params, max_tokens))?
}

pub fn get(store: &Store, user_id: &str, message_id: &str) -> Result<Message> {
    store
        .with_user(user_id, |u| u.messages.get(&MessageId::new(message_id)).cloned())?
        .ok_or_else(|| MailError::resource_not_found("message", message_id))
}

/// Compose and send a message: builds its MIME payload, assigns it a new
/// thread, labels it `SENT`, and reconciles label/profile counters.
pub fn send(store: &Store, user_id: &str, input: ComposeInput) -> Result<Message> {
    let subject = input.subject.clone();
    let to = input.to.clone();
    let cc = input.cc.clone();
    let bcc = input.bcc.clone();
    let from = input.from.clone();
    let snippet = make_snippet(&input.body_text);
    let payload = mime::build_raw(store, input);

    let message_id = MessageId::new(store.next_counter("message").to_string());
    let thread_id = ThreadId::new(store.next_counter("thread").to_string());
    let history_id = store.bump_history(user_id)?;
    let from = match from {
        Some(addr) => addr,
        None => EmailAddress::new(store.get_profile(user_id)?.email_address),
    };

    let message = Message::builder(message_id.clone(), thread_id.clone())
        .from(from)
        .to(to)
        .cc(cc)
        .bcc(bcc)
        .subject(subject)
        .snippet(snippet.clone())
        .history_id(history_id.clone())
        .internal_date(Utc::now().timestamp_millis())
        .label_ids(vec!["SENT".to_string()])
        .payload(payload)
        .build();

    store.with_user_mut(user_id, |u| {
        u.messages.insert(message.id.clone(), message.clone());
        let mut thread = Thread::new(thread_id.clone(), history_id.clone());
        thread.snippet = snippet;
        thread.message_ids.push(message.id.clone());
        u.threads.insert(thread_id.clone(), thread);
        u.history.push(HistoryRecord {
            id: history_id,
            event: HistoryEvent::MessageAdded { message_id: message.id.clone() },
        });
        crate::labels::ensure_labels_exist(u, &message.label_ids);
        crate::labels::recompute(u);
    })?;

    info!("[MESSAGES] sent {} in thread {}", message.id, message.thread_id);
    Ok(message)
}

/// Directly insert a fully-formed message resource (Gmail's `messages.insert`),
/// assigning it to a new thread unless `thread_id` is already set.
pub fn insert(store: &Store, user_id: &str, mut message: Message) -> Result<Message> {
    if message.id.as_str().is_empty() {
        message.id = MessageId::new(store.next_counter("message").to_string());
    }
    if message.thread_id.as_str().is_empty() {
        message.thread_id = ThreadId::new(store.next_counter("thread").to_string());
    }
    let history_id = store.bump_history(user_id)?;
    message.history_id = history_id.clone();

    store.with_user_mut(user_id, |u| {
        let thread_id = message.thread_id.clone();
        u.threads
            .entry(thread_id.clone())
            .or_insert_with(|| Thread::new(thread_id, history_id.clone()))
            .message_ids
            .push(message.id.clone());
        u.history.push(HistoryRecord {
            id: history_id,
            event: HistoryEvent::MessageAdded { message_id: message.id.clone() },
        });
        crate::labels::ensure_labels_exist(u, &message.label_ids);
        u.messages.insert(message.id.clone(), message.clone());
        crate::labels::recompute(u);
    })?;

    Ok(message)
}

/// Parse a base64url raw MIME blob and insert it as a message, matching
/// Gmail's `messages.import`.
pub fn import(store: &Store, user_id: &str, raw: &str, label_ids: Vec<String>) -> Result<Message> {
    let payload = mime::parse_raw(raw)?;
    let snippet = make_snippet(raw);
    let message = Message::builder(
        MessageId::new(store.next_counter("message").to_string()),
        ThreadId::new(store.next_counter("thread").to_string()),
    )
    .snippet(snippet)
    .internal_date(Utc::now().timestamp_millis())
    .label_ids(label_ids)
    .payload(payload)
    .build();

    insert(store, user_id, message)
}

/// Add and remove labels on a message, keeping `is_read` in lockstep with
/// `UNREAD` label presence so the two can never diverge (spec §9.1).
pub fn modify(
    store: &Store,
    user_id: &str,
    message_id: &str,
    add_label_ids: Vec<String>,
    remove_label_ids: Vec<String>,
) -> Result<Message> {
    debug!("[MESSAGES] modify {message_id}: +{add_label_ids:?} -{remove_label_ids:?}");
    let history_id = store.bump_history(user_id)?;
    let id = MessageId::new(message_id);

    store.with_user_mut(user_id, |u| -> Result<Message> {
        crate::labels::ensure_labels_exist(u, &add_label_ids);
        let message = u
            .messages
            .get_mut(&id)
            .ok_or_else(|| MailError::resource_not_found("message", message_id))?;

        for label in &add_label_ids {
            if !message.has_label(label) {
                message.label_ids.push(label.clone());
            }
        }
        message.label_ids.retain(|l| !remove_label_ids.iter().any(|r| r.eq_ignore_ascii_case(l)));
        message.is_read = !message.label_ids.iter().any(|l| l.eq_ignore_ascii_case("UNREAD"));
        message.history_id = history_id.clone();

        let result = message.clone();
        if !add_label_ids.is_empty() {
            u.history.push(HistoryRecord {
                id: history_id.clone(),
                event: HistoryEvent::LabelsAdded {
                    message_id: id.clone(),
                    label_ids: add_label_ids.iter().map(|l| crate::models::LabelId::new(l.clone())).collect(),
                },
            });
        }
        if !remove_label_ids.is_empty() {
            u.history.push(HistoryRecord {
                id: history_id,
                event: HistoryEvent::LabelsRemoved {
                    message_id: id.clone(),
                    label_ids: remove_label_ids.iter().map(|l| crate::models::LabelId::new(l.clone())).collect(),
                },
            });
        }
        crate::labels::recompute(u);
        Ok(result)
    })?
}

pub fn trash(store: &Store, user_id: &str, message_id: &str) -> Result<Message> {
    modify(store, user_id, message_id, vec!["TRASH".to_string()], vec!["INBOX".to_string()])
}

pub fn untrash(store: &Store, user_id: &str, message_id: &str) -> Result<Message> {
    modify(store, user_id, message_id, vec!["INBOX".to_string()], vec!["TRASH".to_string()])
}

/// Apply the same label add/remove to a batch of messages as a single
/// history/counter-reconciliation unit, matching Gmail's `messages.batchModify`.
/// Every message id is validated to exist before any message is mutated.
pub fn batch_modify(
    store: &Store,
    user_id: &str,
    message_ids: Vec<String>,
    add_label_ids: Vec<String>,
    remove_label_ids: Vec<String>,
) -> Result<Vec<Message>> {
    debug!(
        "[MESSAGES] batchModify {} messages: +{add_label_ids:?} -{remove_label_ids:?}",
        message_ids.len()
    );
    let history_id = store.bump_history(user_id)?;

    store.with_user_mut(user_id, |u| -> Result<Vec<Message>> {
        for message_id in &message_ids {
            if !u.messages.contains_key(&MessageId::new(message_id.clone())) {
                return Err(MailError::resource_not_found("message", message_id));
            }
        }

        crate::labels::ensure_labels_exist(u, &add_label_ids);
        let mut results = Vec::with_capacity(message_ids.len());
        for message_id in &message_ids {
            let id = MessageId::new(message_id.clone());
            let message = u.messages.get_mut(&id).expect("existence validated above");

            for label in &add_label_ids {
                if !message.has_label(label) {
                    message.label_ids.push(label.clone());
                }
            }
            message.label_ids.retain(|l| !remove_label_ids.iter().any(|r| r.eq_ignore_ascii_case(l)));
            message.is_read = !message.label_ids.iter().any(|l| l.eq_ignore_ascii_case("UNREAD"));
            message.history_id = history_id.clone();
            results.push(message.clone());

            if !add_label_ids.is_empty() {
                u.history.push(HistoryRecord {
                    id: history_id.clone(),
                    event: HistoryEvent::LabelsAdded {
                        message_id: id.clone(),
                        label_ids: add_label_ids.iter().map(|l| crate::models::LabelId::new(l.clone())).collect(),
                    },
                });
            }
            if !remove_label_ids.is_empty() {
                u.history.push(HistoryRecord {
                    id: history_id.clone(),
                    event: HistoryEvent::LabelsRemoved {
                        message_id: id.clone(),
                        label_ids: remove_label_ids.iter().map(|l| crate::models::LabelId::new(l.clone())).collect(),
                    },
                });
            }
        }
        crate::labels::recompute(u);
        Ok(results)
    })?
}

/// Permanently remove a batch of messages as a single history/counter-
/// reconciliation unit, matching Gmail's `messages.batchDelete`. Every
/// message id is validated to exist before any message is removed.
pub fn batch_delete(store: &Store, user_id: &str, message_ids: Vec<String>) -> Result<()> {
    let history_id = store.bump_history(user_id)?;

    let attachment_ids = store.with_user_mut(user_id, |u| -> Result<Vec<String>> {
        for message_id in &message_ids {
            if !u.messages.contains_key(&MessageId::new(message_id.clone())) {
                return Err(MailError::resource_not_found("message", message_id));
            }
        }

        let mut released = Vec::new();
        for message_id in &message_ids {
            let id = MessageId::new(message_id.clone());
            let message = u.messages.remove(&id).expect("existence validated above");

            if let Some(thread) = u.threads.get_mut(&message.thread_id) {
                thread.message_ids.retain(|m| m != &id);
                if thread.message_ids.is_empty() {
                    let thread_id = message.thread_id.clone();
                    u.threads.remove(&thread_id);
                }
            }

            u.history.push(HistoryRecord {
                id: history_id.clone(),
                event: HistoryEvent::MessageDeleted { message_id: id.clone() },
            });

            released.extend(message.payload.flat_parts().iter().filter_map(|p| p.body.attachment_id.clone()));
        }
        crate::labels::recompute(u);
        Ok(released)
    })??;

    for attachment_id in attachment_ids {
        store.release_attachment(&attachment_id);
    }
    info!("[MESSAGES] batchDelete {} messages", message_ids.len());
    Ok(())
}

/// Permanently remove a message: detaches it from its thread (removing the
/// thread too if it becomes empty), releases any attachments it referenced,
/// and reconciles counters.
pub fn delete(store: &Store, user_id: &str, message_id: &str) -> Result<()> {
    let history_id = store.bump_history(user_id)?;
    let id = MessageId::new(message_id);

    let attachment_ids = store.with_user_mut(user_id, |u| -> Result<Vec<String>> {
        let message = u
            .messages
            .remove(&id)
            .ok_or_else(|| MailError::resource_not_found("message", message_id))?;

        if let Some(thread) = u.threads.get_mut(&message.thread_id) {
            thread.message_ids.retain(|m| m != &id);
            if thread.message_ids.is_empty() {
                let thread_id = message.thread_id.clone();
                u.threads.remove(&thread_id);
            }
        }

        u.history.push(HistoryRecord {
            id: history_id,
            event: HistoryEvent::MessageDeleted { message_id: id.clone() },
        });
        crate::labels::recompute(u);

        Ok(message
            .payload
            .flat_parts()
            .iter()
            .filter_map(|p| p.body.attachment_id.clone())
            .collect())
    })??;

    for attachment_id in attachment_ids {
        store.release_attachment(&attachment_id);
    }
    info!("[MESSAGES] deleted {message_id}");
    Ok(())
}

pub mod attachments {
    use super::*;

    /// Fetch an attachment for a message, re-validating the message actually
    /// references it. Returns `None` (not an error) if the message, the
    /// reference, or the attachment itself is missing.
    pub fn get(store: &Store, user_id: &str, message_id: &str, attachment_id: &str) -> Result<Option<Attachment>> {
        let message = super::get(store, user_id, message_id)?;
        Ok(mime::get_attachment(store, &message, attachment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::ComposeInput;

    fn fresh_store() -> Store {
        let store = Store::empty();
        store.reset_db();
        store
    }

    #[test]
    fn test_send_creates_message_and_thread() {
        let store = fresh_store();
        let msg = send(
            &store,
            "me",
            ComposeInput {
                to: vec![EmailAddress::new("bob@example.com")],
                subject: "hi".to_string(),
                body_text: "hello there".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(msg.has_label("SENT"));
        let thread_exists = store.with_user("me", |u| u.threads.contains_key(&msg.thread_id)).unwrap();
        assert!(thread_exists);
    }

    #[test]
    fn test_modify_syncs_unread_flag() {
        let store = fresh_store();
        let msg = send(&store, "me", ComposeInput { subject: "x".to_string(), ..Default::default() }).unwrap();
        let modified = modify(&store, "me", msg.id.as_str(), vec!["UNREAD".to_string()], vec![]).unwrap();
        assert!(modified.is_unread());
        let fixed = modify(&store, "me", msg.id.as_str(), vec![], vec!["UNREAD".to_string()]).unwrap();
        assert!(!fixed.is_unread());
    }

    #[test]
    fn test_trash_then_untrash() {
        let store = fresh_store();
        let msg = send(&store, "me", ComposeInput { subject: "x".to_string(), ..Default::default() }).unwrap();
        let trashed = trash(&store, "me", msg.id.as_str()).unwrap();
        assert!(trashed.has_label("TRASH"));
        let untrashed = untrash(&store, "me", msg.id.as_str()).unwrap();
        assert!(!untrashed.has_label("TRASH"));
    }

    #[test]
    fn test_delete_removes_message_and_empty_thread() {
        let store = fresh_store();
        let msg = send(&store, "me", ComposeInput { subject: "x".to_string(), ..Default::default() }).unwrap();
        let thread_id = msg.thread_id.clone();
        delete(&store, "me", msg.id.as_str()).unwrap();
        assert!(get(&store, "me", msg.id.as_str()).is_err());
        let thread_gone = store.with_user("me", |u| !u.threads.contains_key(&thread_id)).unwrap();
        assert!(thread_gone);
    }

    #[test]
    fn test_batch_modify_applies_to_every_message() {
        let store = fresh_store();
        let m1 = send(&store, "me", ComposeInput { subject: "a".to_string(), ..Default::default() }).unwrap();
        let m2 = send(&store, "me", ComposeInput { subject: "b".to_string(), ..Default::default() }).unwrap();
        let results = batch_modify(
            &store,
            "me",
            vec![m1.id.as_str().to_string(), m2.id.as_str().to_string()],
            vec!["IMPORTANT".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|m| m.has_label("IMPORTANT")));
    }

    #[test]
    fn test_batch_modify_rejects_unknown_id_without_mutating() {
        let store = fresh_store();
        let m1 = send(&store, "me", ComposeInput { subject: "a".to_string(), ..Default::default() }).unwrap();
        let err = batch_modify(
            &store,
            "me",
            vec![m1.id.as_str().to_string(), "nonexistent".to_string()],
            vec!["IMPORTANT".to_string()],
            vec![],
        );
        assert!(err.is_err());
        let unchanged = get(&store, "me", m1.id.as_str()).unwrap();
        assert!(!unchanged.has_label("IMPORTANT"));
    }

    #[test]
    fn test_batch_delete_removes_every_message() {
        let store = fresh_store();
        let m1 = send(&store, "me", ComposeInput { subject: "a".to_string(), ..Default::default() }).unwrap();
        let m2 = send(&store, "me", ComposeInput { subject: "b".to_string(), ..Default::default() }).unwrap();
        batch_delete(&store, "me", vec![m1.id.as_str().to_string(), m2.id.as_str().to_string()]).unwrap();
        assert!(get(&store, "me", m1.id.as_str()).is_err());
        assert!(get(&store, "me", m2.id.as_str()).is_err());
    }
}
