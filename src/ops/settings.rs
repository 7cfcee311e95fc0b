//! `settings.*`: imap/pop/vacation/language/autoForwarding, plus sendAs and
//! smimeInfo CRUD.

use crate::error::{MailError, Result};
use crate::models::{
    AutoForwardingSettings, ImapSettings, LanguageSettings, PopSettings, SendAs, SmimeInfo,
    VacationSettings,
};
use crate::store::Store;

pub fn get_imap(store: &Store, user_id: &str) -> Result<ImapSettings> {
    store.with_user(user_id, |u| u.settings.imap.clone())
}

pub fn update_imap(store: &Store, user_id: &str, settings: ImapSettings) -> Result<ImapSettings> {
    store.with_user_mut(user_id, |u| {
        u.settings.imap = settings;
        u.settings.imap.clone()
    })
}

pub fn get_pop(store: &Store, user_id: &str) -> Result<PopSettings> {
    store.with_user(user_id, |u| u.settings.pop.clone())
}

pub fn update_pop(store: &Store, user_id: &str, settings: PopSettings) -> Result<PopSettings> {
    store.with_user_mut(user_id, |u| {
        u.settings.pop = settings;
        u.settings.pop.clone()
    })
}

pub fn get_vacation(store: &Store, user_id: &str) -> Result<VacationSettings> {
    store.with_user(user_id, |u| u.settings.vacation.clone())
}

pub fn update_vacation(store: &Store, user_id: &str, settings: VacationSettings) -> Result<VacationSettings> {
    store.with_user_mut(user_id, |u| {
        u.settings.vacation = settings;
        u.settings.vacation.clone()
    })
}

pub fn get_language(store: &Store, user_id: &str) -> Result<LanguageSettings> {
    store.with_user(user_id, |u| u.settings.language.clone())
}

pub fn update_language(store: &Store, user_id: &str, settings: LanguageSettings) -> Result<LanguageSettings> {
    store.with_user_mut(user_id, |u| {
        u.settings.language = settings;
        u.settings.language.clone()
    })
}

pub fn get_auto_forwarding(store: &Store, user_id: &str) -> Result<AutoForwardingSettings> {
    store.with_user(user_id, |u| u.settings.auto_forwarding.clone())
}

pub fn update_auto_forwarding(store: &Store, user_id: &str, settings: AutoForwardingSettings) -> Result<AutoForwardingSettings> {
    store.with_user_mut(user_id, |u| {
        u.settings.auto_forwarding = settings;
        u.settings.auto_forwarding.clone()
    })
}

pub mod send_as {
    use super::*;

    pub fn create(store: &Store, user_id: &str, send_as: SendAs) -> Result<SendAs> {
        let email = send_as.send_as_email.clone();
        store.with_user_mut(user_id, |u| -> Result<SendAs> {
            if u.settings.send_as.contains_key(&email) {
                return Err(MailError::Conflict(format!("sendAs already exists: {email}")));
            }
            u.settings.send_as.insert(email.clone(), send_as.clone());
            Ok(send_as)
        })?
    }

    pub fn get(store: &Store, user_id: &str, send_as_email: &str) -> Result<SendAs> {
        store
            .with_user(user_id, |u| u.settings.send_as.get(send_as_email).cloned())?
            .ok_or_else(|| MailError::resource_not_found("sendAs", send_as_email))
    }

    pub fn list(store: &Store, user_id: &str) -> Result<Vec<SendAs>> {
        store.with_user(user_id, |u| u.settings.send_as.values().cloned().collect())
    }

    pub fn update(store: &Store, user_id: &str, send_as_email: &str, send_as: SendAs) -> Result<SendAs> {
        store.with_user_mut(user_id, |u| -> Result<SendAs> {
            let slot = u
                .settings
                .send_as
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("sendAs", send_as_email))?;
            *slot = send_as;
            Ok(slot.clone())
        })?
    }

    pub fn delete(store: &Store, user_id: &str, send_as_email: &str) -> Result<()> {
        store.with_user_mut(user_id, |u| -> Result<()> {
            u.settings
                .send_as
                .remove(send_as_email)
                .map(|_| ())
                .ok_or_else(|| MailError::resource_not_found("sendAs", send_as_email))
        })?
    }

    /// Partial update: only overwrite fields the caller actually supplied.
    pub fn patch(
        store: &Store,
        user_id: &str,
        send_as_email: &str,
        display_name: Option<String>,
        is_default: Option<bool>,
        is_primary: Option<bool>,
    ) -> Result<SendAs> {
        store.with_user_mut(user_id, |u| -> Result<SendAs> {
            let slot = u
                .settings
                .send_as
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("sendAs", send_as_email))?;
            if let Some(v) = display_name {
                slot.display_name = Some(v);
            }
            if let Some(v) = is_default {
                slot.is_default = v;
            }
            if let Some(v) = is_primary {
                slot.is_primary = v;
            }
            Ok(slot.clone())
        })?
    }

    /// Mark a sendAs alias verified. Real Gmail sends a confirmation email to
    /// the alias address and flips this once the user clicks through; there is
    /// no mail transport here, so verification succeeds immediately.
    pub fn verify(store: &Store, user_id: &str, send_as_email: &str) -> Result<()> {
        store.with_user_mut(user_id, |u| -> Result<()> {
            let slot = u
                .settings
                .send_as
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("sendAs", send_as_email))?;
            slot.is_verified = true;
            Ok(())
        })?
    }
}

pub mod smime_info {
    use super::*;

    pub fn insert(store: &Store, user_id: &str, send_as_email: &str, mut info: SmimeInfo) -> Result<SmimeInfo> {
        if info.id.is_empty() {
            info.id = store.next_counter("smime").to_string();
        }
        store.with_user_mut(user_id, |u| {
            u.settings
                .smime_info
                .entry(send_as_email.to_string())
                .or_default()
                .insert(info.id.clone(), info.clone());
            info.clone()
        })
    }

    pub fn get(store: &Store, user_id: &str, send_as_email: &str, id: &str) -> Result<SmimeInfo> {
        store
            .with_user(user_id, |u| {
                u.settings.smime_info.get(send_as_email).and_then(|m| m.get(id)).cloned()
            })?
            .ok_or_else(|| MailError::resource_not_found("smimeInfo", id))
    }

    pub fn list(store: &Store, user_id: &str, send_as_email: &str) -> Result<Vec<SmimeInfo>> {
        store.with_user(user_id, |u| {
            u.settings
                .smime_info
                .get(send_as_email)
                .map(|m| m.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn delete(store: &Store, user_id: &str, send_as_email: &str, id: &str) -> Result<()> {
        store.with_user_mut(user_id, |u| -> Result<()> {
            let map = u
                .settings
                .smime_info
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("smimeInfo", id))?;
            map.remove(id).map(|_| ()).ok_or_else(|| MailError::resource_not_found("smimeInfo", id))
        })?
    }

    /// Full replace of a smimeInfo's mutable fields. The id is never
    /// caller-settable.
    pub fn update(store: &Store, user_id: &str, send_as_email: &str, id: &str, mut info: SmimeInfo) -> Result<SmimeInfo> {
        info.id = id.to_string();
        store.with_user_mut(user_id, |u| -> Result<SmimeInfo> {
            let map = u
                .settings
                .smime_info
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("smimeInfo", id))?;
            let slot = map.get_mut(id).ok_or_else(|| MailError::resource_not_found("smimeInfo", id))?;
            *slot = info;
            Ok(slot.clone())
        })?
    }

    /// Partial update: only overwrite fields the caller actually supplied.
    pub fn patch(
        store: &Store,
        user_id: &str,
        send_as_email: &str,
        id: &str,
        is_default: Option<bool>,
        issuer_cn: Option<String>,
    ) -> Result<SmimeInfo> {
        store.with_user_mut(user_id, |u| -> Result<SmimeInfo> {
            let map = u
                .settings
                .smime_info
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("smimeInfo", id))?;
            if !map.contains_key(id) {
                return Err(MailError::resource_not_found("smimeInfo", id));
            }
            if let Some(v) = issuer_cn {
                map.get_mut(id).unwrap().issuer_cn = Some(v);
            }
            if is_default == Some(true) {
                for (key, entry) in map.iter_mut() {
                    entry.is_default = key == id;
                }
            } else if let Some(v) = is_default {
                map.get_mut(id).unwrap().is_default = v;
            }
            Ok(map.get(id).unwrap().clone())
        })?
    }

    /// Mark one smimeInfo as the default for a sendAs alias, clearing the
    /// flag on every other entry for that alias.
    pub fn set_default(store: &Store, user_id: &str, send_as_email: &str, id: &str) -> Result<()> {
        store.with_user_mut(user_id, |u| -> Result<()> {
            let map = u
                .settings
                .smime_info
                .get_mut(send_as_email)
                .ok_or_else(|| MailError::resource_not_found("smimeInfo", id))?;
            if !map.contains_key(id) {
                return Err(MailError::resource_not_found("smimeInfo", id));
            }
            for (key, info) in map.iter_mut() {
                info.is_default = key == id;
            }
            Ok(())
        })?
    }
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
    fn test_update_vacation_round_trip() {
        let store = fresh_store();
        update_vacation(
            &store,
            "me",
            VacationSettings {
                enable_auto_reply: true,
                response_subject: Some("Out of office".to_string()),
                response_body_plain_text: None,
            },
        )
        .unwrap();
        let fetched = get_vacation(&store, "me").unwrap();
        assert!(fetched.enable_auto_reply);
    }

    #[test]
    fn test_send_as_create_then_conflict() {
        let store = fresh_store();
        let sa = SendAs {
            send_as_email: "alias@example.com".to_string(),
            display_name: None,
            is_default: false,
            is_primary: false,
            is_verified: false,
        };
        send_as::create(&store, "me", sa.clone()).unwrap();
        assert!(matches!(send_as::create(&store, "me", sa), Err(MailError::Conflict(_))));
    }

    #[test]
    fn test_send_as_patch_only_touches_supplied_fields() {
        let store = fresh_store();
        let sa = SendAs {
            send_as_email: "alias@example.com".to_string(),
            display_name: Some("Old Name".to_string()),
            is_default: false,
            is_primary: false,
            is_verified: false,
        };
        send_as::create(&store, "me", sa).unwrap();
        let patched = send_as::patch(&store, "me", "alias@example.com", None, Some(true), None).unwrap();
        assert_eq!(patched.display_name, Some("Old Name".to_string()));
        assert!(patched.is_default);
    }

    #[test]
    fn test_send_as_verify_sets_flag() {
        let store = fresh_store();
        let sa = SendAs {
            send_as_email: "alias@example.com".to_string(),
            display_name: None,
            is_default: false,
            is_primary: false,
            is_verified: false,
        };
        send_as::create(&store, "me", sa).unwrap();
        send_as::verify(&store, "me", "alias@example.com").unwrap();
        assert!(send_as::get(&store, "me", "alias@example.com").unwrap().is_verified);
    }

    #[test]
    fn test_smime_set_default_clears_others() {
        let store = fresh_store();
        let a = smime_info::insert(&store, "me", "alias@example.com", SmimeInfo { id: String::new(), is_default: true, issuer_cn: None }).unwrap();
        let b = smime_info::insert(&store, "me", "alias@example.com", SmimeInfo { id: String::new(), is_default: false, issuer_cn: None }).unwrap();
        smime_info::set_default(&store, "me", "alias@example.com", &b.id).unwrap();
        let a2 = smime_info::get(&store, "me", "alias@example.com", &a.id).unwrap();
        let b2 = smime_info::get(&store, "me", "alias@example.com", &b.id).unwrap();
        assert!(!a2.is_default);
        assert!(b2.is_default);
    }

    #[test]
    fn test_smime_update_full_replace() {
        let store = fresh_store();
        let a = smime_info::insert(&store, "me", "alias@example.com", SmimeInfo { id: String::new(), is_default: false, issuer_cn: Some("old".to_string()) }).unwrap();
        let updated = smime_info::update(
            &store,
            "me",
            "alias@example.com",
            &a.id,
            SmimeInfo { id: String::new(), is_default: false, issuer_cn: Some("new".to_string()) },
        )
        .unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.issuer_cn, Some("new".to_string()));
    }

    #[test]
    fn test_smime_patch_setting_default_clears_others() {
        let store = fresh_store();
        let a = smime_info::insert(&store, "me", "alias@example.com", SmimeInfo { id: String::new(), is_default: true, issuer_cn: None }).unwrap();
        let b = smime_info::insert(&store, "me", "alias@example.com", SmimeInfo { id: String::new(), is_default: false, issuer_cn: None }).unwrap();
        smime_info::patch(&store, "me", "alias@example.com", &b.id, Some(true), Some("new-issuer".to_string())).unwrap();
        let a2 = smime_info::get(&store, "me", "alias@example.com", &a.id).unwrap();
        let b2 = smime_info::get(&store, "me", "alias@example.com", &b.id).unwrap();
        assert!(!a2.is_default);
        assert!(b2.is_default);
        assert_eq!(b2.issuer_cn, Some("new-issuer".to_string()));
    }
}
