//! Mailbox push-notification registration (`users.watch`/`users.stop`).

use serde::{Deserialize, Serialize};

/// The hardcoded expiration the reference simulator always returns from
/// `watch()`, rather than computing a real expiry.
pub const WATCH_EXPIRATION: &str = "9999999999999";

/// An opaque watch request. The simulator does not act on its contents
/// (no push delivery exists); it is stored and echoed back verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Watch {
    #[serde(default)]
    pub request: serde_json::Value,
}
