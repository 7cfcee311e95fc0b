//! Gmail-style search: query language, evaluation, and result pagination.

pub mod attachment_types;
pub mod datetime;
pub mod evaluator;
pub mod predicates;
pub mod size;
pub mod text_index;
pub mod tokenizer;

pub use predicates::EvalContext;

use crate::error::{MailError, Result};
use crate::models::{Draft, DraftId, Message, MessageId};
use chrono::Utc;
use std::collections::{HashMap, HashSet};

/// Parameters accepted by `messages.list`/`threads.list` search, per the
/// Gmail-shaped list API.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    pub label_ids: Vec<String>,
    pub include_spam_trash: bool,
    pub max_results: usize,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub message_ids: Vec<MessageId>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: usize,
}

/// Run a full search: validate the query, build the label/spam/trash-scoped
/// candidate set, evaluate the query over it, then sort by `internalDate`
/// descending (ties broken by id descending) and paginate.
pub fn search_messages(
    messages: &HashMap<MessageId, Message>,
    params: &SearchParams,
    max_tokens: usize,
) -> Result<SearchPage> {
    if !params.query.is_empty() && params.query.trim().is_empty() {
        return Err(MailError::InvalidArgument("q must not be blank".to_string()));
    }

    let candidates: HashMap<MessageId, Message> = messages
        .iter()
        .filter(|(_, m)| {
            let in_scope_label =
                params.label_ids.is_empty() || params.label_ids.iter().all(|l| m.has_label(l));
            let is_spam_or_trash = m.has_label("SPAM") || m.has_label("TRASH");
            in_scope_label && (params.include_spam_trash || !is_spam_or_trash)
        })
        .map(|(id, m)| (id.clone(), m.clone()))
        .collect();

    let ctx = EvalContext {
        messages: &candidates,
        now: Utc::now(),
    };
    let matched = evaluator::evaluate(&params.query, &ctx, max_tokens)?;

    let mut sorted: Vec<&Message> = matched.iter().filter_map(|id| candidates.get(id)).collect();
    sorted.sort_by(|a, b| {
        b.internal_date
            .cmp(&a.internal_date)
            .then_with(|| b.id.as_str().cmp(a.id.as_str()))
    });

    let offset: usize = params
        .page_token
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let result_size_estimate = sorted.len();
    let page: Vec<MessageId> = sorted
        .into_iter()
        .skip(offset)
        .take(params.max_results.max(1))
        .map(|m| m.id.clone())
        .collect();

    let next_page_token = if offset + page.len() < result_size_estimate {
        Some((offset + page.len()).to_string())
    } else {
        None
    };

    Ok(SearchPage {
        message_ids: page,
        next_page_token,
        result_size_estimate,
    })
}

/// Evaluate a query over a user's drafts, by scanning each draft's embedded
/// message the same way `messages.list` scans real messages. The reference
/// simulator's draft evaluator shares every predicate with the message
/// evaluator except that subject/body search is scoped to the draft itself —
/// that falls out for free here since the embedded message *is* the
/// candidate being matched.
pub fn search_drafts(
    drafts: &HashMap<DraftId, Draft>,
    query: &str,
    max_tokens: usize,
) -> Result<HashSet<DraftId>> {
    let synthetic: HashMap<MessageId, Message> = drafts
        .iter()
        .map(|(id, d)| (MessageId::new(id.as_str()), d.message.clone()))
        .collect();
    let ctx = EvalContext {
        messages: &synthetic,
        now: Utc::now(),
    };
    let matched = evaluator::evaluate(query, &ctx, max_tokens)?;
    Ok(matched.into_iter().map(|id| DraftId::new(id.0)).collect())
}
