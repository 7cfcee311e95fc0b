//! `labels.*`: create/update/patch/get/list/delete.

use crate::error::{MailError, Result};
use crate::models::{Label, LabelId};
use crate::store::Store;
use log::info;

pub fn create(store: &Store, user_id: &str, name: &str) -> Result<Label> {
    if name.trim().is_empty() {
        return Err(MailError::InvalidArgument("label name must not be empty".to_string()));
    }
    let id = LabelId::new(if LabelId::is_system(name) { name.to_ascii_uppercase() } else { name.to_string() });
    let label = if LabelId::is_system(name) {
        Label::system(id.as_str())
    } else {
        Label::user(id.as_str(), name)
    };

    store.with_user_mut(user_id, |u| -> Result<Label> {
        if u.labels.contains_key(&id) {
            return Err(MailError::Conflict(format!("label already exists: {}", id.as_str())));
        }
        u.labels.insert(label.id.clone(), label.clone());
        Ok(label)
    })?
}

pub fn get(store: &Store, user_id: &str, label_id: &str) -> Result<Label> {
    let id = LabelId::new(label_id);
    store
        .with_user(user_id, |u| u.labels.get(&id).cloned())?
        .ok_or_else(|| MailError::resource_not_found("label", label_id))
}

pub fn list(store: &Store, user_id: &str) -> Result<Vec<Label>> {
    store.with_user(user_id, |u| u.labels.values().cloned().collect())
}

/// Full replace of a label's mutable fields (`labels.update`). Counts and
/// id/type are never caller-settable.
pub fn update(store: &Store, user_id: &str, label_id: &str, name: String, label_list_visibility: String, message_list_visibility: String) -> Result<Label> {
    let id = LabelId::new(label_id);
    store.with_user_mut(user_id, |u| -> Result<Label> {
        let label = u.labels.get_mut(&id).ok_or_else(|| MailError::resource_not_found("label", label_id))?;
        label.name = name;
        label.label_list_visibility = label_list_visibility;
        label.message_list_visibility = message_list_visibility;
        Ok(label.clone())
    })?
}

/// Partial update: only overwrite fields the caller actually supplied.
pub fn patch(
    store: &Store,
    user_id: &str,
    label_id: &str,
    name: Option<String>,
    label_list_visibility: Option<String>,
    message_list_visibility: Option<String>,
) -> Result<Label> {
    let id = LabelId::new(label_id);
    store.with_user_mut(user_id, |u| -> Result<Label> {
        let label = u.labels.get_mut(&id).ok_or_else(|| MailError::resource_not_found("label", label_id))?;
        if let Some(name) = name {
            label.name = name;
        }
        if let Some(v) = label_list_visibility {
            label.label_list_visibility = v;
        }
        if let Some(v) = message_list_visibility {
            label.message_list_visibility = v;
        }
        Ok(label.clone())
    })?
}

/// Delete a user label. System labels cannot be deleted, matching Gmail.
/// Every message and draft still referencing the deleted label has it
/// scrubbed from `label_ids` in the same step, otherwise the verifier would
/// treat the dangling reference as grounds to auto-recreate the label.
pub fn delete(store: &Store, user_id: &str, label_id: &str) -> Result<()> {
    if LabelId::is_system(label_id) {
        return Err(MailError::InvalidArgument(format!("cannot delete system label: {label_id}")));
    }
    let id = LabelId::new(label_id);
    store.with_user_mut(user_id, |u| -> Result<()> {
        u.labels.remove(&id).map(|_| ()).ok_or_else(|| MailError::resource_not_found("label", label_id))?;
        for message in u.messages.values_mut() {
            message.label_ids.retain(|l| LabelId::new(l.clone()) != id);
        }
        for draft in u.drafts.values_mut() {
            draft.message.label_ids.retain(|l| LabelId::new(l.clone()) != id);
        }
        crate::labels::recompute(u);
        Ok(())
    })??;
    info!("[LABELS] deleted {label_id}");
    Ok(())
}
