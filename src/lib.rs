//! A Gmail-like multi-tenant mailbox simulator.
//!
//! Holds an in-memory `Store` of per-user mailboxes (messages, threads,
//! drafts, labels, settings) behind a Gmail-resource-shaped data model, and
//! exposes a `users`/`messages`/`drafts`/`threads`/`labels`/`settings`
//! operations API on top of it, including a Gmail-style search query
//! language for `messages.list`/`threads.list`/`drafts.list`.

pub mod config;
pub mod error;
pub mod labels;
pub mod mime;
pub mod models;
pub mod ops;
pub mod search;
pub mod store;

pub use error::{MailError, Result};
pub use models::{
    Attachment, Draft, DraftId, EmailAddress, Label, LabelId, Message, MessageId, Profile,
    Settings, Thread, ThreadId, UserId,
};
pub use search::{SearchParams, SearchPage};
pub use store::{Store, StoreSnapshot};
