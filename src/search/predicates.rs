//! Field predicate dispatch: one function per Gmail-style query operator.

use super::attachment_types::{detect_attachment_type, detect_star_type, infer_category_from_labels};
use super::datetime::{parse_date, parse_time_period_days};
use super::size::{calculate_message_size, parse_size};
use super::text_index::{field_contains, matches_anywhere, ContentField};
use super::tokenizer::unquote;
use crate::models::{Message, MessageId};
use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;

/// Everything a predicate needs to evaluate against: the candidate message
/// set already scoped by label/spam/trash upstream, plus that user's full
/// label table for category inference.
pub struct EvalContext<'a> {
    pub messages: &'a std::collections::HashMap<MessageId, Message>,
    pub now: chrono::DateTime<Utc>,
}

type Set = HashSet<MessageId>;

/// Join addresses the way the reference simulator's flat `recipient` string
/// is built, so `to:` can compare against the whole field rather than any
/// one address in the list.
fn joined_recipients(addrs: &[crate::models::EmailAddress]) -> String {
    addrs.iter().map(|a| a.email.as_str()).collect::<Vec<_>>().join(", ")
}

fn filter_ids<'a>(
    ctx: &'a EvalContext<'a>,
    universe: &Set,
    pred: impl Fn(&Message) -> bool,
) -> Set {
    universe
        .iter()
        .filter(|id| ctx.messages.get(*id).is_some_and(&pred))
        .cloned()
        .collect()
}

/// Dispatch a single `field:value` term. Returns `None` for keys this
/// evaluator does not recognize as a field predicate, so the caller can fall
/// back to bare-keyword search on the whole term.
pub fn field(ctx: &EvalContext, universe: &Set, key: &str, value: &str) -> Option<Set> {
    let value = unquote(value);
    let key_lower = key.to_ascii_lowercase();

    Some(match key_lower.as_str() {
        "from" => filter_ids(ctx, universe, |m| m.from.email.eq_ignore_ascii_case(value)),
        "to" => filter_ids(ctx, universe, |m| joined_recipients(&m.to).eq_ignore_ascii_case(value)),
        "cc" => filter_ids(ctx, universe, |m| {
            m.cc.iter().any(|a| a.email.to_ascii_lowercase().contains(&value.to_ascii_lowercase()))
        }),
        "bcc" => filter_ids(ctx, universe, |m| {
            m.bcc.iter().any(|a| a.email.to_ascii_lowercase().contains(&value.to_ascii_lowercase()))
        }),
        "label" => {
            let wanted = value.to_ascii_uppercase();
            filter_ids(ctx, universe, |m| {
                m.label_ids.iter().any(|l| l.to_ascii_uppercase() == wanted)
            })
        }
        "subject" => filter_ids(ctx, universe, |m| field_contains(m, ContentField::Subject, value)),
        "body" => filter_ids(ctx, universe, |m| field_contains(m, ContentField::Body, value)),
        "filename" => filter_ids(ctx, universe, |m| {
            m.payload
                .flat_parts()
                .iter()
                .any(|p| p.filename.to_ascii_lowercase().contains(&value.to_ascii_lowercase()))
        }),
        "after" => match parse_date(value, ctx.now) {
            Some(cutoff) => filter_ids(ctx, universe, |m| m.internal_date > cutoff.timestamp_millis()),
            None => Set::new(),
        },
        "before" => match parse_date(value, ctx.now) {
            Some(cutoff) => filter_ids(ctx, universe, |m| m.internal_date < cutoff.timestamp_millis()),
            None => Set::new(),
        },
        "older_than" => match parse_time_period_days(value) {
            Some(days) => {
                let cutoff = ctx.now.timestamp_millis() - (days * 86_400_000.0) as i64;
                filter_ids(ctx, universe, |m| m.internal_date < cutoff)
            }
            None => Set::new(),
        },
        "newer_than" => match parse_time_period_days(value) {
            Some(days) => {
                let cutoff = ctx.now.timestamp_millis() - (days * 86_400_000.0) as i64;
                filter_ids(ctx, universe, |m| m.internal_date > cutoff)
            }
            None => Set::new(),
        },
        "size" => match value.parse::<u64>().ok() {
            Some(target) => filter_ids(ctx, universe, |m| calculate_message_size(m) == target),
            None => Set::new(),
        },
        "larger" => match parse_size(value) {
            Some(target) => filter_ids(ctx, universe, |m| calculate_message_size(m) > target),
            None => Set::new(),
        },
        "smaller" => match parse_size(value) {
            Some(target) => filter_ids(ctx, universe, |m| calculate_message_size(m) < target),
            None => Set::new(),
        },
        "is" => match value.to_ascii_lowercase().as_str() {
            "unread" => filter_ids(ctx, universe, |m| m.is_unread()),
            "read" => filter_ids(ctx, universe, |m| !m.is_unread()),
            "starred" => filter_ids(ctx, universe, |m| m.is_starred()),
            "important" => filter_ids(ctx, universe, |m| m.has_label("IMPORTANT")),
            _ => Set::new(),
        },
        "category" => {
            let wanted = value.to_ascii_lowercase();
            if !super::attachment_types::CATEGORIES.contains(&wanted.as_str()) {
                Set::new()
            } else {
                filter_ids(ctx, universe, |m| {
                    infer_category_from_labels(&m.label_ids) == Some(wanted.as_str())
                })
            }
        }
        "list" => filter_ids(ctx, universe, |m| {
            m.from.email.to_ascii_lowercase().contains(&value.to_ascii_lowercase())
        }),
        "deliveredto" => filter_ids(ctx, universe, |m| {
            m.to.iter().any(|a| a.email.to_ascii_lowercase().contains(&value.to_ascii_lowercase()))
        }),
        "rfc822msgid" => filter_ids(ctx, universe, |m| m.id.as_str().contains(value)),
        "has" => has_predicate(ctx, universe, value),
        "in" => match value.to_ascii_lowercase().as_str() {
            "anywhere" => universe.clone(),
            "snoozed" => Set::new(),
            other => {
                let wanted = other.to_ascii_uppercase();
                filter_ids(ctx, universe, |m| {
                    m.label_ids.iter().any(|l| l.to_ascii_uppercase() == wanted)
                })
            }
        },
        _ => return None,
    })
}

fn has_predicate(ctx: &EvalContext, universe: &Set, value: &str) -> Set {
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "attachment" => filter_ids(ctx, universe, |m| {
            m.payload.flat_parts().iter().any(|p| p.body.attachment_id.is_some())
        }),
        "userlabels" => filter_ids(ctx, universe, |m| {
            m.label_ids.iter().any(|l| !crate::models::LabelId::is_system(l))
        }),
        "nouserlabels" => filter_ids(ctx, universe, |m| {
            !m.label_ids.iter().any(|l| !crate::models::LabelId::is_system(l))
        }),
        "star" | "yellow-star" | "orange-star" | "red-star" | "purple-star" | "blue-star"
        | "green-star" | "red-bang" | "yellow-bang" | "orange-guillemet" | "green-check"
        | "blue-info" | "purple-question" => {
            filter_ids(ctx, universe, |m| {
                m.label_ids.iter().any(|l| detect_star_type(l) == Some(lower.as_str()))
            })
        }
        specific => filter_ids(ctx, universe, |m| {
            m.payload
                .flat_parts()
                .iter()
                .any(|p| detect_attachment_type(p) == Some(specific))
        }),
    }
}

/// `+keyword` exact-word match: `\bword\b`, case-insensitive, across
/// subject/body/sender/recipient.
pub fn exact_word_match(ctx: &EvalContext, universe: &Set, word: &str) -> Set {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
    let Ok(re) = Regex::new(&pattern) else {
        return Set::new();
    };
    filter_ids(ctx, universe, |m| {
        [
            ContentField::Subject,
            ContentField::Body,
            ContentField::Sender,
            ContentField::Recipient,
        ]
        .iter()
        .any(|field| re.is_match(&super::text_index::field_text(m, *field)))
    })
}

/// Bare keyword free-text search across subject/body/sender/recipient.
pub fn keyword_search(ctx: &EvalContext, universe: &Set, term: &str) -> Set {
    let term = unquote(term);
    filter_ids(ctx, universe, |m| matches_anywhere(m, term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailAddress, MessageId, ThreadId};
    use std::collections::HashMap;

    fn ctx_with(messages: Vec<Message>) -> (HashMap<MessageId, Message>, Set) {
        let mut map = HashMap::new();
        let mut universe = Set::new();
        for m in messages {
            universe.insert(m.id.clone());
            map.insert(m.id.clone(), m);
        }
        (map, universe)
    }

    #[test]
    fn test_from_predicate_exact_match() {
        let m1 = Message::builder(MessageId::new("m1"), ThreadId::new("t1"))
            .from(EmailAddress::new("alice@example.com"))
            .build();
        let (map, universe) = ctx_with(vec![m1]);
        let ctx = EvalContext { messages: &map, now: Utc::now() };
        let result = field(&ctx, &universe, "from", "alice@example.com").unwrap();
        assert_eq!(result.len(), 1);
        let result = field(&ctx, &universe, "from", "bob@example.com").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_is_unread_predicate() {
        let mut m1 = Message::builder(MessageId::new("m1"), ThreadId::new("t1")).build();
        m1.is_read = false;
        let (map, universe) = ctx_with(vec![m1]);
        let ctx = EvalContext { messages: &map, now: Utc::now() };
        let result = field(&ctx, &universe, "is", "unread").unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_in_anywhere_returns_universe() {
        let m1 = Message::builder(MessageId::new("m1"), ThreadId::new("t1")).build();
        let (map, universe) = ctx_with(vec![m1]);
        let ctx = EvalContext { messages: &map, now: Utc::now() };
        let result = field(&ctx, &universe, "in", "anywhere").unwrap();
        assert_eq!(result, universe);
    }

    #[test]
    fn test_to_predicate_matches_whole_joined_recipient_field_only() {
        let m1 = Message::builder(MessageId::new("m1"), ThreadId::new("t1"))
            .to(vec![EmailAddress::new("alice@example.com"), EmailAddress::new("bob@example.com")])
            .build();
        let (map, universe) = ctx_with(vec![m1]);
        let ctx = EvalContext { messages: &map, now: Utc::now() };

        assert!(field(&ctx, &universe, "to", "alice@example.com").unwrap().is_empty());
        let result = field(&ctx, &universe, "to", "alice@example.com, bob@example.com").unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_unknown_field_returns_none() {
        let (map, universe) = ctx_with(vec![]);
        let ctx = EvalContext { messages: &map, now: Utc::now() };
        assert!(field(&ctx, &universe, "notafield", "x").is_none());
    }
}
