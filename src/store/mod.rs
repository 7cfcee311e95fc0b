//! In-memory, multi-tenant mailbox state.
//!
//! One `Store` is a whole simulated mail service: a global counters table,
//! a global content-addressed attachment table, and a map of per-user
//! `UserData` aggregates. Each concern lives behind its own `RwLock`,
//! following the same per-concern-locking shape as a single monolithic
//! store guarding one giant map.

use crate::config;
use crate::error::{MailError, Result};
use crate::models::{Attachment, Profile, Settings, UserData};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Whole-service state, serializable as the JSON snapshot described by the
/// external interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub users: HashMap<String, UserData>,
    pub attachments: HashMap<String, Attachment>,
    pub counters: HashMap<String, u64>,
}

pub struct Store {
    users: RwLock<HashMap<String, UserData>>,
    attachments: RwLock<HashMap<String, Attachment>>,
    counters: RwLock<HashMap<String, u64>>,
}

impl Store {
    /// An empty store with no users at all (distinct from `reset_db`, which
    /// seeds the conventional single `"me"` user).
    pub fn empty() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            attachments: RwLock::new(HashMap::new()),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Reset to the canonical fresh-install state: a single `"me"` user with
    /// the standard system labels and zeroed counters. Mirrors the reference
    /// simulator's `reset_db()` exactly, including its non-obvious defaults
    /// (label counter starts at 10; STARRED/CATEGORY_* are recognized but not
    /// pre-created).
    pub fn reset_db(&self) {
        let mut users = self.users.write().unwrap();
        users.clear();
        users.insert("me".to_string(), Self::default_me_user());

        let mut counters = self.counters.write().unwrap();
        counters.clear();
        for (key, start) in [
            ("message", 0),
            ("thread", 0),
            ("draft", 0),
            ("label", 10),
            ("history", 0),
            ("smime", 0),
        ] {
            counters.insert(key.to_string(), start);
        }

        self.attachments.write().unwrap().clear();
    }

    fn default_me_user() -> UserData {
        let mut user = UserData::new("me@gmail.com");
        for label in ["INBOX", "UNREAD", "IMPORTANT", "SENT", "DRAFT", "TRASH", "SPAM"] {
            let l = crate::models::Label::system(label);
            user.labels.insert(l.id.clone(), l);
        }
        user
    }

    /// Resolve a caller-supplied `userId` to its canonical primary key:
    /// `"me"` or any other primary key resolves to itself, and an email
    /// address that matches some user's `profile.emailAddress` resolves to
    /// that user's key. Every mailbox operation translates `userId` exactly
    /// once at the entry point, via this function.
    fn resolve_user_id(&self, user_id: &str) -> Result<String> {
        let users = self.users.read().unwrap();
        if users.contains_key(user_id) {
            return Ok(user_id.to_string());
        }
        users
            .iter()
            .find(|(_, data)| data.profile.email_address == user_id)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| MailError::UserNotFound(user_id.to_string()))
    }

    /// Ensure a user exists, returning `UserNotFound` if not. Most operations
    /// call this before touching per-user state.
    pub fn ensure_user(&self, user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(MailError::InvalidArgument("userId must not be empty".into()));
        }
        self.resolve_user_id(user_id).map(|_| ())
    }

    pub fn exists_user(&self, user_id: &str) -> Result<bool> {
        if user_id.trim().is_empty() {
            return Err(MailError::InvalidArgument("userId must not be empty".into()));
        }
        Ok(self.resolve_user_id(user_id).is_ok())
    }

    /// Create a new user with the given profile email, matching the
    /// reference simulator's `createUser`. Returns `Conflict` if the user
    /// already exists.
    pub fn create_user(&self, user_id: &str, email_address: impl Into<String>) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(MailError::InvalidArgument("userId must not be empty".into()));
        }
        let email_address = email_address.into();
        if email_address.trim().is_empty() {
            return Err(MailError::InvalidArgument("emailAddress must not be empty".into()));
        }
        let mut users = self.users.write().unwrap();
        if users.contains_key(user_id) {
            return Err(MailError::Conflict(format!("user already exists: {user_id}")));
        }
        let user = UserData::new(email_address);
        users.insert(user_id.to_string(), user);
        Ok(())
    }

    pub fn get_history_id(&self, user_id: &str) -> Result<String> {
        self.with_user(user_id, |u| u.profile.history_id.clone())
    }

    /// Allocate the next value for a named counter (e.g. `"message"`,
    /// `"label"`), returning it as a string the way resource IDs are built.
    pub fn next_counter(&self, name: &str) -> u64 {
        let mut counters = self.counters.write().unwrap();
        let entry = counters.entry(name.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn bump_history(&self, user_id: &str) -> Result<String> {
        self.with_user_mut(user_id, |u| {
            let next: u64 = u.profile.history_id.parse().unwrap_or(0) + 1;
            u.profile.history_id = next.to_string();
            u.profile.history_id.clone()
        })
    }

    /// Run a closure with read-only access to a user's aggregate state.
    /// `user_id` is resolved to its canonical primary key first, so a caller
    /// may pass `"me"`, any other primary key, or a matching email address.
    pub fn with_user<T>(&self, user_id: &str, f: impl FnOnce(&UserData) -> T) -> Result<T> {
        let resolved = self.resolve_user_id(user_id)?;
        let users = self.users.read().unwrap();
        let user = users
            .get(&resolved)
            .ok_or_else(|| MailError::UserNotFound(user_id.to_string()))?;
        Ok(f(user))
    }

    /// Run a closure with mutable access to a user's aggregate state.
    /// `user_id` is resolved to its canonical primary key first, so a caller
    /// may pass `"me"`, any other primary key, or a matching email address.
    pub fn with_user_mut<T>(&self, user_id: &str, f: impl FnOnce(&mut UserData) -> T) -> Result<T> {
        let resolved = self.resolve_user_id(user_id)?;
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(&resolved)
            .ok_or_else(|| MailError::UserNotFound(user_id.to_string()))?;
        Ok(f(user))
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.users.read().unwrap().keys().cloned().collect()
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.with_user(user_id, |u| u.profile.clone())
    }

    pub fn get_settings(&self, user_id: &str) -> Result<Settings> {
        self.with_user(user_id, |u| u.settings.clone())
    }

    // --- Global attachment table -------------------------------------------------

    pub fn get_attachment(&self, attachment_id: &str) -> Option<Attachment> {
        self.attachments.read().unwrap().get(attachment_id).cloned()
    }

    /// Insert an attachment, or bump its reference count if the same
    /// content-hash ID is already present.
    pub fn put_attachment(&self, attachment: Attachment) {
        let mut table = self.attachments.write().unwrap();
        table
            .entry(attachment.attachment_id.clone())
            .and_modify(|existing| existing.ref_count += 1)
            .or_insert(attachment);
    }

    /// Decrement an attachment's reference count, removing it once it drops
    /// to zero (lazy garbage collection).
    pub fn release_attachment(&self, attachment_id: &str) {
        let mut table = self.attachments.write().unwrap();
        let mut remove = false;
        if let Some(existing) = table.get_mut(attachment_id) {
            if existing.ref_count <= 1 {
                remove = true;
            } else {
                existing.ref_count -= 1;
            }
        }
        if remove {
            table.remove(attachment_id);
        }
    }

    // --- Snapshotting -------------------------------------------------------

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            users: self.users.read().unwrap().clone(),
            attachments: self.attachments.read().unwrap().clone(),
            counters: self.counters.read().unwrap().clone(),
        }
    }

    pub fn load(&self, snapshot: StoreSnapshot) {
        *self.users.write().unwrap() = snapshot.users;
        *self.attachments.write().unwrap() = snapshot.attachments;
        *self.counters.write().unwrap() = snapshot.counters;
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        config::save_json_file(path, &self.snapshot())
    }

    pub fn load_from_path(&self, path: &Path) -> anyhow::Result<()> {
        let snapshot: StoreSnapshot = config::load_json_file(path)
            .with_context(|| format!("failed to load snapshot from {}", path.display()))?;
        self.load(snapshot);
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_db_seeds_me_user_and_counters() {
        let store = Store::empty();
        store.reset_db();

        assert!(store.exists_user("me").unwrap());
        let profile = store.get_profile("me").unwrap();
        assert_eq!(profile.email_address, "me@gmail.com");
        assert_eq!(profile.history_id, "1");

        let labels = store.with_user("me", |u| u.labels.len()).unwrap();
        assert_eq!(labels, 7);

        assert_eq!(store.next_counter("label"), 11);
    }

    #[test]
    fn test_with_user_resolves_by_email_address() {
        let store = Store::empty();
        store.reset_db();
        let profile = store.with_user("me@gmail.com", |u| u.profile.clone()).unwrap();
        assert_eq!(profile.email_address, "me@gmail.com");
    }

    #[test]
    fn test_ensure_user_missing() {
        let store = Store::empty();
        assert!(matches!(
            store.ensure_user("nobody"),
            Err(MailError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_create_user_conflict() {
        let store = Store::empty();
        store.create_user("alt", "alt@example.com").unwrap();
        assert!(matches!(
            store.create_user("alt", "alt@example.com"),
            Err(MailError::Conflict(_))
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = Store::empty();
        store.reset_db();
        let snap = store.snapshot();

        let other = Store::empty();
        other.load(snap);
        assert!(other.exists_user("me").unwrap());
    }

    #[test]
    fn test_attachment_ref_counting() {
        let store = Store::empty();
        let att = Attachment::new("hash1", "ZGF0YQ", 4);
        store.put_attachment(att);
        store.put_attachment(Attachment::new("hash1", "ZGF0YQ", 4));
        assert_eq!(store.get_attachment("hash1").unwrap().ref_count, 2);

        store.release_attachment("hash1");
        assert_eq!(store.get_attachment("hash1").unwrap().ref_count, 1);

        store.release_attachment("hash1");
        assert!(store.get_attachment("hash1").is_none());
    }
}
