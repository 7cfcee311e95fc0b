//! Per-user mailbox settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapSettings {
    pub enabled: bool,
}

impl Default for ImapSettings {
    fn default() -> Self {
        Self { enabled: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopSettings {
    pub access_window: String,
}

impl Default for PopSettings {
    fn default() -> Self {
        Self {
            access_window: "disabled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationSettings {
    pub enable_auto_reply: bool,
    #[serde(default)]
    pub response_subject: Option<String>,
    #[serde(default)]
    pub response_body_plain_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSettings {
    pub display_language: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            display_language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoForwardingSettings {
    pub enabled: bool,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAs {
    pub send_as_email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmimeInfo {
    pub id: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub issuer_cn: Option<String>,
}

/// All configurable per-user mailbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub imap: ImapSettings,
    pub pop: PopSettings,
    pub vacation: VacationSettings,
    pub language: LanguageSettings,
    pub auto_forwarding: AutoForwardingSettings,
    #[serde(default)]
    pub send_as: HashMap<String, SendAs>,
    #[serde(default)]
    pub smime_info: HashMap<String, HashMap<String, SmimeInfo>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            imap: ImapSettings::default(),
            pop: PopSettings::default(),
            vacation: VacationSettings::default(),
            language: LanguageSettings::default(),
            auto_forwarding: AutoForwardingSettings::default(),
            send_as: HashMap::new(),
            smime_info: HashMap::new(),
        }
    }
}
