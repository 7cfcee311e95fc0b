//! `users.*`: profile lookup, account creation, watch registration, and the
//! history log. Grounded on `Users/__init__.py` and `Users/History.py`.

use crate::error::{MailError, Result};
use crate::models::{HistoryRecord, Profile, Watch, WATCH_EXPIRATION};
use crate::store::Store;

/// Input for `users.create_user`, mirroring the original's
/// `ProfileInputModel` validation (non-empty `emailAddress` required).
#[derive(Debug, Clone)]
pub struct CreateUserProfile {
    pub email_address: String,
}

/// Look up a user's profile summary. Validates `userId` is non-empty before
/// resolving, matching the original's explicit pre-condition check.
pub fn get_profile(store: &Store, user_id: &str) -> Result<Profile> {
    if user_id.trim().is_empty() {
        return Err(MailError::InvalidArgument("userId must not be empty".to_string()));
    }
    store.get_profile(user_id)
}

pub fn create_user(store: &Store, user_id: &str, profile: CreateUserProfile) -> Result<Profile> {
    store.create_user(user_id, profile.email_address)?;
    store.get_profile(user_id)
}

#[derive(Debug, Clone)]
pub struct WatchResponse {
    pub history_id: String,
    pub expiration: String,
}

/// Register an opaque watch request. The simulator never delivers push
/// notifications; the request is stored and echoed back with a fixed
/// far-future expiration, matching the original's hardcoded value.
pub fn watch(store: &Store, user_id: &str, request: serde_json::Value) -> Result<WatchResponse> {
    let history_id = store.with_user_mut(user_id, |u| {
        u.watch = Some(Watch { request });
        u.profile.history_id.clone()
    })?;
    Ok(WatchResponse {
        history_id,
        expiration: WATCH_EXPIRATION.to_string(),
    })
}

pub fn stop(store: &Store, user_id: &str) -> Result<()> {
    store.with_user_mut(user_id, |u| {
        u.watch = None;
    })
}

/// Parameters accepted by `users.history.list`. Like the original, only
/// `max_results` actually bounds the returned slice — the rest are accepted
/// for API compatibility and otherwise ignored, not silently dropped.
#[derive(Debug, Clone, Default)]
pub struct HistoryListParams {
    pub max_results: Option<usize>,
    pub page_token: Option<String>,
    pub start_history_id: Option<String>,
    pub label_id: Option<String>,
    pub history_types: Vec<String>,
}

pub fn list_history(store: &Store, user_id: &str, params: HistoryListParams) -> Result<Vec<HistoryRecord>> {
    store.with_user(user_id, |u| {
        let mut records = u.history.clone();
        if let Some(max) = params.max_results {
            records.truncate(max);
        }
        records
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_profile_rejects_blank_user_id() {
        let store = Store::empty();
        assert!(matches!(
            get_profile(&store, ""),
            Err(MailError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_user_then_get_profile() {
        let store = Store::empty();
        create_user(
            &store,
            "alt",
            CreateUserProfile {
                email_address: "alt@example.com".to_string(),
            },
        )
        .unwrap();
        let profile = get_profile(&store, "alt").unwrap();
        assert_eq!(profile.email_address, "alt@example.com");
    }

    #[test]
    fn test_watch_then_stop() {
        let store = Store::empty();
        store.reset_db();
        let resp = watch(&store, "me", serde_json::json!({"topicName": "x"})).unwrap();
        assert_eq!(resp.expiration, WATCH_EXPIRATION);
        stop(&store, "me").unwrap();
        let has_watch = store.with_user("me", |u| u.watch.is_some()).unwrap();
        assert!(!has_watch);
    }
}
