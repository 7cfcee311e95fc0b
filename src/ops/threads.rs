//! `threads.*`: get/list/modify/trash/untrash/delete. A thread is a view
//! over its member messages — every mutation here just applies the matching
//! `messages::*` operation to each message in the thread.

use crate::error::{MailError, Result};
use crate::models::{Thread, ThreadId};
use crate::search::{self, SearchParams};
use crate::store::Store;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ThreadsPage {
    pub thread_ids: Vec<ThreadId>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: usize,
}

pub fn get(store: &Store, user_id: &str, thread_id: &str) -> Result<Thread> {
    let id = ThreadId::new(thread_id);
    store
        .with_user(user_id, |u| u.threads.get(&id).cloned())?
        .ok_or_else(|| MailError::resource_not_found("thread", thread_id))
}

/// List threads matching a search: search messages, collapse to their
/// owning threads in descending-`internalDate` order, then paginate over
/// the thread list.
pub fn list(store: &Store, user_id: &str, params: SearchParams, max_tokens: usize) -> Result<ThreadsPage> {
    let full_scan = SearchParams { max_results: usize::MAX, page_token: None, ..params.clone() };
    let message_page = store.with_user(user_id, |u| search::search_messages(&u.messages, &full_scan, max_tokens))??;

    let ordered_thread_ids: Vec<ThreadId> = store.with_user(user_id, |u| {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for message_id in &message_page.message_ids {
            if let Some(message) = u.messages.get(message_id)
                && seen.insert(message.thread_id.clone())
            {
                out.push(message.thread_id.clone());
            }
        }
        out
    })?;

    let offset: usize = params.page_token.as_deref().and_then(|t| t.parse().ok()).unwrap_or(0);
    let result_size_estimate = ordered_thread_ids.len();
    let page: Vec<ThreadId> = ordered_thread_ids
        .into_iter()
        .skip(offset)
        .take(params.max_results.max(1))
        .collect();
    let next_page_token = if offset + page.len() < result_size_estimate {
        Some((offset + page.len()).to_string())
    } else {
        None
    };

    Ok(ThreadsPage { thread_ids: page, next_page_token, result_size_estimate })
}

fn member_message_ids(store: &Store, user_id: &str, thread_id: &str) -> Result<Vec<String>> {
    let id = ThreadId::new(thread_id);
    store
        .with_user(user_id, |u| {
            u.threads.get(&id).map(|t| t.message_ids.iter().map(|m| m.as_str().to_string()).collect())
        })?
        .ok_or_else(|| MailError::resource_not_found("thread", thread_id))
}

pub fn modify(
    store: &Store,
    user_id: &str,
    thread_id: &str,
    add_label_ids: Vec<String>,
    remove_label_ids: Vec<String>,
) -> Result<Thread> {
    for message_id in member_message_ids(store, user_id, thread_id)? {
        super::messages::modify(store, user_id, &message_id, add_label_ids.clone(), remove_label_ids.clone())?;
    }
    get(store, user_id, thread_id)
}

pub fn trash(store: &Store, user_id: &str, thread_id: &str) -> Result<Thread> {
    modify(store, user_id, thread_id, vec!["TRASH".to_string()], vec!["INBOX".to_string()])
}

pub fn untrash(store: &Store, user_id: &str, thread_id: &str) -> Result<Thread> {
    modify(store, user_id, thread_id, vec!["INBOX".to_string()], vec!["TRASH".to_string()])
}

pub fn delete(store: &Store, user_id: &str, thread_id: &str) -> Result<()> {
    for message_id in member_message_ids(store, user_id, thread_id)? {
        super::messages::delete(store, user_id, &message_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::ComposeInput;
    use crate::ops::messages;

    fn fresh_store() -> Store {
        let store = Store::empty();
        store.reset_db();
        store
    }

    #[test]
    fn test_thread_modify_applies_to_all_messages() {
        let store = fresh_store();
        let msg = messages::send(&store, "me", ComposeInput { subject: "x".to_string(), ..Default::default() }).unwrap();
        modify(&store, "me", msg.thread_id.as_str(), vec!["IMPORTANT".to_string()], vec![]).unwrap();
        let refreshed = messages::get(&store, "me", msg.id.as_str()).unwrap();
        assert!(refreshed.has_label("IMPORTANT"));
    }

    #[test]
    fn test_thread_delete_removes_thread_and_messages() {
        let store = fresh_store();
        let msg = messages::send(&store, "me", ComposeInput { subject: "x".to_string(), ..Default::default() }).unwrap();
        let thread_id = msg.thread_id.clone();
        delete(&store, "me", thread_id.as_str()).unwrap();
        assert!(get(&store, "me", thread_id.as_str()).is_err());
        assert!(messages::get(&store, "me", msg.id.as_str()).is_err());
    }
}
