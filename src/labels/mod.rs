//! Label auto-creation and the count verifier/repairer.

use crate::error::Result;
use crate::models::{Label, LabelCounts, LabelId, UserData};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ensure every label id referenced by `label_ids` exists on the user,
/// auto-creating any that are missing. System labels (by the uppercase
/// allow-list) are always created/looked-up under their uppercase form;
/// user labels preserve the caller's original casing. Non-string label ids
/// upstream of this layer are the caller's problem; this function only
/// ever sees already-validated strings.
pub fn ensure_labels_exist(user: &mut UserData, label_ids: &[String]) {
    for raw in label_ids {
        let key = if LabelId::is_system(raw) {
            raw.to_ascii_uppercase()
        } else {
            raw.clone()
        };
        let id = LabelId::new(key.clone());
        if user.labels.contains_key(&id) {
            continue;
        }
        let label = if LabelId::is_system(raw) {
            Label::system(key)
        } else {
            Label::user(key, raw.clone())
        };
        user.labels.insert(label.id.clone(), label);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CountDiff {
    pub expected: u64,
    pub actual: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LabelDiffs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<CountDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_unread: Option<CountDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_total: Option<CountDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_unread: Option<CountDiff>,
}

impl LabelDiffs {
    fn is_empty(&self) -> bool {
        self.messages_total.is_none()
            && self.messages_unread.is_none()
            && self.threads_total.is_none()
            && self.threads_unread.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileDiffs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<CountDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_total: Option<CountDiff>,
}

impl ProfileDiffs {
    fn is_empty(&self) -> bool {
        self.messages_total.is_none() && self.threads_total.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserReport {
    pub labels: HashMap<String, LabelDiffs>,
    pub profile: ProfileDiffs,
}

impl UserReport {
    fn is_empty(&self) -> bool {
        self.labels.values().all(LabelDiffs::is_empty) && self.profile.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Report {
    pub users: HashMap<String, UserReport>,
    pub has_differences: bool,
}

/// Recompute one user's label and profile counters in place, discarding the
/// diff report. Called after every mailbox mutation so count adjustments
/// stay atomic with their triggering operation (spec §5) without every call
/// site re-deriving the same per-label/per-thread bookkeeping by hand.
pub(crate) fn recompute(user: &mut UserData) {
    verify_user(user, true);
}

/// Recompute every label's and profile's counters from the messages/drafts/
/// threads that actually exist, diff against the stored values, and
/// optionally write the corrected values back. Ports
/// `verify_and_optionally_fix_label_counts` from the reference simulator.
pub fn verify_and_optionally_fix(store: &Store, apply_changes: bool) -> Result<Report> {
    let mut report = Report::default();

    for user_id in store.user_ids() {
        let user_report = store.with_user_mut(&user_id, |user| {
            verify_user(user, apply_changes)
        })?;
        if !user_report.is_empty() {
            report.has_differences = true;
        }
        report.users.insert(user_id, user_report);
    }

    Ok(report)
}

fn verify_user(user: &mut UserData, apply_changes: bool) -> UserReport {
    // Seed computed counts from every label that already exists.
    let mut computed: HashMap<String, LabelCounts> = user
        .labels
        .keys()
        .map(|id| (id.as_str().to_string(), LabelCounts::default()))
        .collect();

    let mut ensure = |computed: &mut HashMap<String, LabelCounts>, raw: &str| -> String {
        let key = if LabelId::is_system(raw) {
            raw.to_ascii_uppercase()
        } else {
            raw.to_string()
        };
        computed.entry(key.clone()).or_default();
        key
    };

    // Messages.
    for message in user.messages.values() {
        let is_unread = message.is_unread();
        for raw in &message.label_ids {
            let key = ensure(&mut computed, raw);
            let entry = computed.get_mut(&key).unwrap();
            entry.messages_total += 1;
            if is_unread {
                entry.messages_unread += 1;
            }
        }
    }

    // Drafts: their embedded message contributes to counts too.
    for draft in user.drafts.values() {
        let is_unread = draft.message.is_unread();
        for raw in &draft.message.label_ids {
            let key = ensure(&mut computed, raw);
            let entry = computed.get_mut(&key).unwrap();
            entry.messages_total += 1;
            if is_unread {
                entry.messages_unread += 1;
            }
        }
    }

    // Threads: union of all member messages' labels.
    for thread in user.threads.values() {
        let mut thread_labels: Vec<String> = Vec::new();
        let mut unread_labels: Vec<String> = Vec::new();
        for message_id in &thread.message_ids {
            let Some(message) = user.messages.get(message_id) else {
                continue;
            };
            let is_unread = message.is_unread();
            for raw in &message.label_ids {
                let key = if LabelId::is_system(raw) {
                    raw.to_ascii_uppercase()
                } else {
                    raw.clone()
                };
                if !thread_labels.contains(&key) {
                    thread_labels.push(key.clone());
                }
                if is_unread && !unread_labels.contains(&key) {
                    unread_labels.push(key);
                }
            }
        }
        for key in &thread_labels {
            let key = ensure(&mut computed, key);
            computed.get_mut(&key).unwrap().threads_total += 1;
        }
        for key in &unread_labels {
            let key = ensure(&mut computed, key);
            computed.get_mut(&key).unwrap().threads_unread += 1;
        }
    }

    // Diff and optionally apply.
    let mut label_diffs: HashMap<String, LabelDiffs> = HashMap::new();
    for (key, expected) in &computed {
        if !user.labels.contains_key(&LabelId::new(key.clone())) {
            let label = if LabelId::is_system(key) {
                Label::system(key.clone())
            } else {
                Label::user(key.clone(), key.clone())
            };
            user.labels.insert(label.id.clone(), label);
        }
        let label = user.labels.get_mut(&LabelId::new(key.clone())).unwrap();
        let mut diffs = LabelDiffs::default();

        if label.counts.messages_total != expected.messages_total {
            diffs.messages_total = Some(CountDiff {
                expected: expected.messages_total,
                actual: label.counts.messages_total,
            });
        }
        if label.counts.messages_unread != expected.messages_unread {
            diffs.messages_unread = Some(CountDiff {
                expected: expected.messages_unread,
                actual: label.counts.messages_unread,
            });
        }
        if label.counts.threads_total != expected.threads_total {
            diffs.threads_total = Some(CountDiff {
                expected: expected.threads_total,
                actual: label.counts.threads_total,
            });
        }
        if label.counts.threads_unread != expected.threads_unread {
            diffs.threads_unread = Some(CountDiff {
                expected: expected.threads_unread,
                actual: label.counts.threads_unread,
            });
        }

        if apply_changes && !diffs.is_empty() {
            label.counts = expected.clone();
        }
        label_diffs.insert(key.clone(), diffs);
    }

    let mut profile_diffs = ProfileDiffs::default();
    let expected_messages = user.messages.len() as u64;
    let expected_threads = user.threads.len() as u64;
    if user.profile.messages_total != expected_messages {
        profile_diffs.messages_total = Some(CountDiff {
            expected: expected_messages,
            actual: user.profile.messages_total,
        });
    }
    if user.profile.threads_total != expected_threads {
        profile_diffs.threads_total = Some(CountDiff {
            expected: expected_threads,
            actual: user.profile.threads_total,
        });
    }
    if apply_changes {
        if profile_diffs.messages_total.is_some() {
            user.profile.messages_total = expected_messages;
        }
        if profile_diffs.threads_total.is_some() {
            user.profile.threads_total = expected_threads;
        }
    }

    UserReport {
        labels: label_diffs,
        profile: profile_diffs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, MessageId, Thread, ThreadId};

    fn mk_message(id: &str, labels: &[&str]) -> Message {
        Message::builder(MessageId::new(id), ThreadId::new("t1"))
            .label_ids(labels.iter().map(|s| s.to_string()).collect())
            .build()
    }

    #[test]
    fn test_ensure_labels_exist_preserves_user_label_case() {
        let mut user = UserData::new("me@gmail.com");
        ensure_labels_exist(&mut user, &["MyLabel".to_string(), "inbox".to_string()]);
        assert!(user.labels.contains_key(&LabelId::new("MyLabel")));
        assert!(user.labels.contains_key(&LabelId::new("INBOX")));
    }

    #[test]
    fn test_verify_detects_and_fixes_stale_counts() {
        let store = Store::empty();
        store.reset_db();
        store
            .with_user_mut("me", |user| {
                let msg = mk_message("m1", &["INBOX", "UNREAD"]);
                user.messages.insert(msg.id.clone(), msg);
                let mut thread = Thread::new(ThreadId::new("t1"), "1");
                thread.message_ids.push(MessageId::new("m1"));
                user.threads.insert(thread.id.clone(), thread);
            })
            .unwrap();

        let report = verify_and_optionally_fix(&store, false).unwrap();
        assert!(report.has_differences);

        let report2 = verify_and_optionally_fix(&store, true).unwrap();
        assert!(report2.has_differences);

        let report3 = verify_and_optionally_fix(&store, false).unwrap();
        assert!(!report3.has_differences);
    }
}
