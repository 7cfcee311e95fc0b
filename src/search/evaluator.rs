//! Recursive-descent query evaluator: OR (lowest precedence), implicit AND,
//! prefix NOT, and `()`/`{}` grouping, over a stateful `(tokens, pos)` cursor.

use super::predicates::{self, EvalContext};
use super::tokenizer::tokenize;
use crate::error::{MailError, Result};
use crate::models::MessageId;
use std::collections::HashSet;

type Set = HashSet<MessageId>;

struct Cursor {
    tokens: Vec<String>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn next(&mut self) -> Option<String> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, tok: &str) {
        if self.peek() == Some(tok) {
            self.next();
        }
    }
}

/// Evaluate a query string against the candidate message set in `ctx`,
/// returning the matching message ids. An empty or whitespace-only query is
/// handled by the caller (spec: empty is legal and matches everything;
/// whitespace-only is `InvalidArgument`).
pub fn evaluate(query: &str, ctx: &EvalContext, max_tokens: usize) -> Result<Set> {
    let tokens = tokenize(query);
    if tokens.len() > max_tokens {
        return Err(MailError::InvalidQuery(format!(
            "query expands to {} tokens, exceeding the limit of {max_tokens}",
            tokens.len()
        )));
    }

    let universe: Set = ctx.messages.keys().cloned().collect();
    if tokens.is_empty() {
        return Ok(universe);
    }

    let mut cursor = Cursor { tokens, pos: 0 };
    Ok(evaluate_or(&mut cursor, ctx, &universe))
}

fn evaluate_or(cursor: &mut Cursor, ctx: &EvalContext, universe: &Set) -> Set {
    let mut result = evaluate_and(cursor, ctx, universe);
    loop {
        match cursor.peek() {
            Some(t) if t.eq_ignore_ascii_case("OR") => {
                cursor.next();
                let rhs = evaluate_and(cursor, ctx, universe);
                result = result.union(&rhs).cloned().collect();
            }
            _ => break,
        }
    }
    result
}

fn evaluate_and(cursor: &mut Cursor, ctx: &EvalContext, universe: &Set) -> Set {
    let mut result: Option<Set> = None;
    loop {
        match cursor.peek() {
            None => break,
            Some(")") | Some("}") => break,
            Some(t) if t.eq_ignore_ascii_case("OR") => break,
            Some(t) if t.eq_ignore_ascii_case("AND") => {
                cursor.next();
            }
            _ => {
                let term_result = evaluate_primary(cursor, ctx, universe);
                result = Some(match result {
                    Some(acc) => acc.intersection(&term_result).cloned().collect(),
                    None => term_result,
                });
            }
        }
    }
    result.unwrap_or_else(|| universe.clone())
}

fn evaluate_primary(cursor: &mut Cursor, ctx: &EvalContext, universe: &Set) -> Set {
    match cursor.peek() {
        Some("-") => {
            cursor.next();
            match cursor.peek() {
                Some("(") | Some("{") => {
                    let group = evaluate_primary(cursor, ctx, universe);
                    universe.difference(&group).cloned().collect()
                }
                // A bare `-` not followed by a group is neutral: it consumes
                // the token and contributes the full universe, matching the
                // reference evaluator's handling of a stray minus sign.
                _ => universe.clone(),
            }
        }
        Some(t) if t.len() > 1 && t.starts_with('-') => {
            let term = cursor.next().unwrap();
            let inner = &term[1..];
            let result = evaluate_term(ctx, universe, inner);
            universe.difference(&result).cloned().collect()
        }
        Some("(") => {
            cursor.next();
            let result = evaluate_or(cursor, ctx, universe);
            cursor.expect(")");
            result
        }
        Some("{") => evaluate_or_group(cursor, ctx, universe),
        Some(_) => {
            let term = cursor.next().unwrap();
            evaluate_term(ctx, universe, &term)
        }
        None => universe.clone(),
    }
}

fn evaluate_or_group(cursor: &mut Cursor, ctx: &EvalContext, universe: &Set) -> Set {
    cursor.expect("{");
    let mut result = Set::new();
    loop {
        match cursor.peek() {
            None => break,
            Some("}") => {
                cursor.next();
                break;
            }
            Some(t) if t.eq_ignore_ascii_case("OR") => {
                cursor.next();
            }
            _ => {
                let term = cursor.next().unwrap();
                let r = evaluate_term(ctx, universe, &term);
                result = result.union(&r).cloned().collect();
            }
        }
    }
    result
}

fn evaluate_term(ctx: &EvalContext, universe: &Set, term: &str) -> Set {
    if let Some(word) = term.strip_prefix('+') {
        return predicates::exact_word_match(ctx, universe, super::tokenizer::unquote(word));
    }

    if let Some((key, value)) = term.split_once(':') {
        if let Some(result) = predicates::field(ctx, universe, key, value) {
            return result;
        }
    }

    predicates::keyword_search(ctx, universe, term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailAddress, Message, MessageId, ThreadId};
    use chrono::Utc;
    use std::collections::HashMap;

    fn ctx_with(messages: Vec<Message>) -> (HashMap<MessageId, Message>, chrono::DateTime<Utc>) {
        let mut map = HashMap::new();
        for m in messages {
            map.insert(m.id.clone(), m);
        }
        (map, Utc::now())
    }

    fn mk(id: &str, from: &str, subject: &str, labels: &[&str]) -> Message {
        Message::builder(MessageId::new(id), ThreadId::new("t1"))
            .from(EmailAddress::new(from))
            .subject(subject)
            .label_ids(labels.iter().map(|s| s.to_string()).collect())
            .build()
    }

    #[test]
    fn test_implicit_and_narrows_results() {
        let messages = vec![
            mk("m1", "alice@example.com", "Budget report", &["INBOX"]),
            mk("m2", "bob@example.com", "Budget report", &["INBOX"]),
        ];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate("from:alice@example.com budget", &ctx, 10_000).unwrap();
        assert_eq!(result, HashSet::from([MessageId::new("m1")]));
    }

    #[test]
    fn test_or_union() {
        let messages = vec![
            mk("m1", "alice@example.com", "x", &["INBOX"]),
            mk("m2", "bob@example.com", "x", &["INBOX"]),
            mk("m3", "carol@example.com", "x", &["INBOX"]),
        ];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate(
            "from:alice@example.com OR from:bob@example.com",
            &ctx,
            10_000,
        )
        .unwrap();
        assert_eq!(
            result,
            HashSet::from([MessageId::new("m1"), MessageId::new("m2")])
        );
    }

    #[test]
    fn test_negation_of_term() {
        let messages = vec![
            mk("m1", "alice@example.com", "x", &["INBOX"]),
            mk("m2", "bob@example.com", "x", &["INBOX"]),
        ];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate("-from:alice@example.com", &ctx, 10_000).unwrap();
        assert_eq!(result, HashSet::from([MessageId::new("m2")]));
    }

    #[test]
    fn test_negated_group() {
        let messages = vec![
            mk("m1", "alice@example.com", "x", &["INBOX"]),
            mk("m2", "bob@example.com", "x", &["INBOX"]),
            mk("m3", "carol@example.com", "x", &["INBOX"]),
        ];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate(
            "-(from:alice@example.com OR from:bob@example.com)",
            &ctx,
            10_000,
        )
        .unwrap();
        assert_eq!(result, HashSet::from([MessageId::new("m3")]));
    }

    #[test]
    fn test_brace_or_group() {
        let messages = vec![
            mk("m1", "x@example.com", "urgent", &["INBOX"]),
            mk("m2", "x@example.com", "fyi", &["INBOX"]),
        ];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate("{urgent fyi}", &ctx, 10_000).unwrap();
        assert_eq!(
            result,
            HashSet::from([MessageId::new("m1"), MessageId::new("m2")])
        );
    }

    #[test]
    fn test_empty_query_matches_universe() {
        let messages = vec![mk("m1", "x@example.com", "x", &["INBOX"])];
        let (map, now) = ctx_with(messages);
        let ctx = EvalContext { messages: &map, now };
        let result = evaluate("", &ctx, 10_000).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_token_budget_rejected() {
        let (map, now) = ctx_with(vec![]);
        let ctx = EvalContext { messages: &map, now };
        let huge = "a ".repeat(5);
        assert!(evaluate(&huge, &ctx, 3).is_err());
    }
}
