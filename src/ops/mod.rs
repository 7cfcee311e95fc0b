//! Mailbox operations API: the public surface grouped by resource noun
//! (`users`, `messages`, `drafts`, `threads`, `labels`, `settings`), matching
//! the teacher's free-function `query::threads` style rather than a
//! "service" struct wrapping the store.

pub mod drafts;
pub mod labels;
pub mod messages;
pub mod settings;
pub mod threads;
pub mod users;
